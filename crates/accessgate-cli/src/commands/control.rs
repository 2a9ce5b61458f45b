//! Control queue commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use accessgate_core::config::AppConfig;
use accessgate_core::error::AppError;
use accessgate_core::types::ControlRequestId;
use accessgate_entity::control::{ControlAttributes, ControlRequest, ControlRequestType};

use crate::output::{self, OutputFormat};

/// Arguments for control commands
#[derive(Debug, Args)]
pub struct ControlArgs {
    /// Control subcommand
    #[command(subcommand)]
    pub command: ControlCommand,
}

/// Control subcommands
#[derive(Debug, Subcommand)]
pub enum ControlCommand {
    /// List recent control requests
    List {
        /// Filter by status (pending, sent, ack, nak)
        #[arg(long)]
        status: Option<String>,
        /// Maximum rows
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Show one control request
    Show {
        /// Control request id
        id: Uuid,
    },
    /// Show queue counts per status
    Stats,
    /// Queue a disconnect for a session or every open session of a user
    Disconnect {
        /// NAS session id
        #[arg(long, conflicts_with = "user", required_unless_present = "user")]
        session: Option<String>,
        /// Subscriber id
        #[arg(long)]
        user: Option<String>,
        /// Operator recorded on the request
        #[arg(long)]
        operator: Option<String>,
        /// Skip confirmation for user-wide disconnects
        #[arg(long)]
        force: bool,
    },
    /// Dispatch pending requests now
    Drain {
        /// Requests to claim
        #[arg(long)]
        batch_size: Option<u32>,
    },
    /// Queue a fresh copy of a nak request
    Requeue {
        /// Control request id
        id: Uuid,
    },
}

/// Control request display row
#[derive(Debug, Serialize, Tabled)]
struct RequestRow {
    id: String,
    session: String,
    #[tabled(rename = "type")]
    request_type: String,
    reason: String,
    status: String,
    code: String,
    created: String,
    error: String,
}

impl From<&ControlRequest> for RequestRow {
    fn from(r: &ControlRequest) -> Self {
        Self {
            id: r.id.to_string(),
            session: r.session_id.clone(),
            request_type: r.request_type.to_string(),
            reason: r.attributes.reason().to_string(),
            status: r.status.to_string(),
            code: output::or_dash(r.response_code),
            created: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            error: output::or_dash(r.error_message.as_ref()),
        }
    }
}

/// Queue count row
#[derive(Debug, Serialize, Tabled)]
struct StatRow {
    status: &'static str,
    count: i64,
}

/// Execute control commands
pub async fn execute(
    args: &ControlArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (pool, services) = super::connect_services(config).await?;
    let dispatch = &services.dispatch;

    match &args.command {
        ControlCommand::List { status, limit } => {
            let status = status.as_deref().map(str::parse).transpose()?;
            let requests = dispatch.list(status, *limit).await?;
            let rows: Vec<RequestRow> = requests.iter().map(RequestRow::from).collect();
            output::print_list(&rows, format);
        }
        ControlCommand::Show { id } => {
            let request = dispatch.find(ControlRequestId::from_uuid(*id)).await?;
            match format {
                OutputFormat::Json => output::print_json(&request),
                OutputFormat::Table => {
                    println!("Control request {}", request.id);
                    output::print_kv("Session", &request.session_id);
                    output::print_kv("Type", request.request_type.as_str());
                    output::print_kv("Reason", request.attributes.reason());
                    output::print_kv("NAS", &request.nas_ip_address);
                    output::print_kv("Status", request.status.as_str());
                    output::print_kv("Response code", &output::or_dash(request.response_code));
                    output::print_kv("Error", &output::or_dash(request.error_message.as_ref()));
                    output::print_kv("Requeued from", &output::or_dash(request.requeued_from));
                    output::print_kv("Created", &request.created_at.to_rfc3339());
                    output::print_kv("Sent", &output::or_dash(request.sent_at));
                    output::print_kv("Responded", &output::or_dash(request.response_at));
                }
            }
        }
        ControlCommand::Stats => {
            let stats = dispatch.stats().await?;
            let rows = vec![
                StatRow { status: "pending", count: stats.pending },
                StatRow { status: "sent", count: stats.sent },
                StatRow { status: "ack", count: stats.ack },
                StatRow { status: "nak", count: stats.nak },
            ];
            output::print_list(&rows, format);
        }
        ControlCommand::Disconnect {
            session,
            user,
            operator,
            force,
        } => {
            let attributes = ControlAttributes::AdminDisconnect {
                operator: operator.clone(),
            };
            let outcomes = match (session, user) {
                (Some(session_id), _) => vec![
                    dispatch
                        .enqueue(session_id, ControlRequestType::Disconnect, attributes)
                        .await?,
                ],
                (None, Some(user_id)) => {
                    if !force {
                        let confirm = dialoguer::Confirm::new()
                            .with_prompt(format!(
                                "Disconnect ALL open sessions of user '{}'?",
                                user_id
                            ))
                            .default(false)
                            .interact()
                            .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;
                        if !confirm {
                            println!("Cancelled.");
                            pool.close().await;
                            return Ok(());
                        }
                    }
                    dispatch.disconnect_user(user_id, attributes).await?
                }
                (None, None) => {
                    return Err(AppError::invalid_request("--session or --user is required"));
                }
            };

            if outcomes.is_empty() {
                output::print_warning("No open sessions found.");
            }
            for outcome in &outcomes {
                let request = outcome.request();
                if outcome.is_created() {
                    output::print_success(&format!(
                        "Disconnect {} queued for session {}",
                        request.id, request.session_id
                    ));
                } else {
                    output::print_warning(&format!(
                        "Disconnect {} already outstanding for session {}",
                        request.id, request.session_id
                    ));
                }
            }
        }
        ControlCommand::Drain { batch_size } => {
            let report = dispatch.drain(*batch_size).await?;
            match format {
                OutputFormat::Json => output::print_json(&report),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Claimed {}, ack {}, nak {} ({} timed out), unresolved {}",
                        report.claimed,
                        report.acked,
                        report.naked,
                        report.timed_out,
                        report.unresolved
                    ));
                }
            }
        }
        ControlCommand::Requeue { id } => {
            let outcome = dispatch.requeue(ControlRequestId::from_uuid(*id)).await?;
            let request = outcome.request();
            if outcome.is_created() {
                output::print_success(&format!("Requeued as {}", request.id));
            } else {
                output::print_warning(&format!(
                    "Request {} is already outstanding for session {}",
                    request.id, request.session_id
                ));
            }
        }
    }

    pool.close().await;
    Ok(())
}

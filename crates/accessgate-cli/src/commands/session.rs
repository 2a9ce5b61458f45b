//! Session inspection commands.

use clap::{Args, Subcommand};

use accessgate_core::config::AppConfig;
use accessgate_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Show a session with its usage and profile
    Show {
        /// NAS session id
        session_id: String,
    },
}

/// Execute session commands
pub async fn execute(
    args: &SessionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (pool, services) = super::connect_services(config).await?;

    match &args.command {
        SessionCommand::Show { session_id } => {
            let detail = services.sessions.detail(session_id).await?;
            match format {
                OutputFormat::Json => output::print_json(&detail),
                OutputFormat::Table => {
                    let s = &detail.session;
                    println!("Session {}", s.session_id);
                    output::print_kv("User", &s.user_id);
                    output::print_kv("State", s.state.as_str());
                    output::print_kv("NAS", &s.nas_ip_address);
                    output::print_kv("NAS port", &output::or_dash(s.nas_port_id.as_ref()));
                    output::print_kv("AP / SSID", &format!(
                        "{} / {}",
                        output::or_dash(s.ap_name.as_ref()),
                        output::or_dash(s.ssid.as_ref())
                    ));
                    output::print_kv("Started", &output::or_dash(s.start_time));
                    output::print_kv("Last seen", &output::or_dash(s.last_seen));
                    output::print_kv("Stopped", &output::or_dash(s.stop_time));
                    output::print_kv("Terminate cause", &output::or_dash(s.terminate_cause()));
                    output::print_kv(
                        "Usage",
                        &format!(
                            "{} MB, {} min",
                            detail.usage.total_mb, detail.usage.total_minutes
                        ),
                    );
                    if let Some(profile) = &detail.profile {
                        output::print_kv(
                            "Profile",
                            &format!(
                                "{} (data {} MB, time {} min)",
                                profile.name,
                                output::or_dash(profile.quota_data_mb),
                                output::or_dash(profile.quota_time_minutes)
                            ),
                        );
                    }
                    if let Some(access) = &detail.user_access {
                        output::print_kv(
                            "User totals",
                            &format!(
                                "{} MB, {} min",
                                access.quota_used_mb, access.minutes_used
                            ),
                        );
                    }
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}

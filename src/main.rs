#![warn(clippy::unwrap_used)]

use clap::Parser as _;

use std::path::PathBuf;
use std::process::ExitCode;

use informe::api::{ApiClient, DEFAULT_BASE_URL};
use informe::error::ContextError;
use informe::layout;
use informe::report::VehicleReport;
use informe::revision;
use informe::session::SessionStore;
use informe::share::{ShareMessage, DEFAULT_FRONT_BASE_URL};

/// Command line client for shared vehicle workshop reports.
#[derive(clap::Parser)]
#[command(name = "informe", version, about)]
struct CliArguments {
    /// The base URL of the report service.
    #[arg(long = "base-url", value_name = "url", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Fetch a shared report by token and render it into a PDF document.
    Fetch {
        /// The share token of the report.
        #[arg(value_name = "token")]
        token: String,
        /// The path of the output PDF file. Defaults to
        /// `informe-vehiculo-<VIN>.pdf` in the current directory.
        #[arg(short = 'o', long = "output", value_name = "output_file")]
        output_pdf_path: Option<PathBuf>,
        /// Also save the raw report payload next to the PDF as JSON.
        #[arg(long = "save-json", value_name = "json_file")]
        save_json_path: Option<PathBuf>,
        /// Send the stored session token as an authorization header. Only
        /// needed for deployments that gate the report endpoint.
        #[arg(long = "with-auth")]
        with_auth: bool,
    },
    /// Render a PDF from a report previously saved as JSON, without contacting
    /// the service.
    Render {
        /// The path of the saved report JSON file.
        #[arg(short = 'i', long = "input", value_name = "report_file")]
        report_path: PathBuf,
        /// The path of the output PDF file.
        #[arg(short = 'o', long = "output", value_name = "output_file")]
        output_pdf_path: Option<PathBuf>,
    },
    /// Print the public share link for a report token.
    Share {
        /// The share token of the report.
        #[arg(value_name = "token")]
        token: String,
        /// The base URL of the front-end resolving share links.
        #[arg(long = "front-url", value_name = "url", default_value = DEFAULT_FRONT_BASE_URL)]
        front_base_url: String,
    },
    /// Log in against the service and store the session token.
    Login {
        #[arg(short = 'u', long = "username")]
        username: String,
        #[arg(short = 'p', long = "password")]
        password: String,
    },
    /// Discard the stored session token.
    Logout,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli_arguments = CliArguments::parse();

    match run(cli_arguments) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli_arguments: CliArguments) -> Result<(), Box<dyn std::error::Error>> {
    let session = SessionStore::from_environment()?;

    match cli_arguments.command {
        Command::Fetch {
            token,
            output_pdf_path,
            save_json_path,
            with_auth,
        } => {
            let client = ApiClient::new(&cli_arguments.base_url, with_auth, session)?;
            let report = client.load_report(&token)?;

            if let Some(json_path) = save_json_path {
                let payload = serde_json::to_string_pretty(&report).map_err(|error| {
                    ContextError::with_error("Unable to serialize the report", &error)
                })?;
                std::fs::write(&json_path, payload).map_err(|error| {
                    ContextError::with_error(
                        format!("Unable to write the report JSON to {:?}", json_path),
                        &error,
                    )
                })?;
            }

            let output_pdf_path = render_to_file(&report, output_pdf_path)?;
            println!("Informe guardado en {}", output_pdf_path.display());
        }
        Command::Render {
            report_path,
            output_pdf_path,
        } => {
            let report = VehicleReport::from_path(&report_path)?;
            let output_pdf_path = render_to_file(&report, output_pdf_path)?;
            println!("Informe guardado en {}", output_pdf_path.display());
        }
        Command::Share {
            token,
            front_base_url,
        } => {
            let message = ShareMessage::for_report(&front_base_url, &token);
            println!("{}", message.title);
            println!("{}", message.text);
            println!("{}", message.url);
        }
        Command::Login { username, password } => {
            let client = ApiClient::new(&cli_arguments.base_url, false, session)?;
            client.login(&username, &password)?;
            println!("Sesion iniciada como {username}");
        }
        Command::Logout => {
            session.clear()?;
            println!("Sesion cerrada");
        }
    }

    Ok(())
}

/// Normalizes, renders and saves a report, returning the path written to.
fn render_to_file(
    report: &VehicleReport,
    output_pdf_path: Option<PathBuf>,
) -> Result<PathBuf, ContextError> {
    let normalized = revision::normalize(&report.vehicle.revision);
    log::info!(
        "Rendering {} revision sections and {} errors",
        normalized.len(),
        report.errors.len()
    );

    let mut document = layout::render_report(report, &normalized)?;
    let output_pdf_path = output_pdf_path
        .unwrap_or_else(|| PathBuf::from(layout::report_file_name(&report.vehicle.vin)));
    document.save_to_file(&output_pdf_path, instance_id())?;

    Ok(output_pdf_path)
}

/// A fresh instance ID for the PDF trailer, derived from the wall clock.
fn instance_id() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!("{:032}", now.unix_timestamp_nanos().unsigned_abs())
}

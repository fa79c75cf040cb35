use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use pedia_attendance::config::Config;
use pedia_attendance::report::{render_attendance_list, render_export, write_records_csv};
use pedia_attendance::shell::{AppShell, Screen, devices_from_config};
use pedia_attendance::{Result, logging};

#[derive(Parser, Debug)]
#[command(author, version, about = "PediaAttendance: registro de asistencia con foto y ubicación")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inicia sesión con teléfono (o correo) y contraseña
    Login {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// Cierra la sesión guardada
    Logout,
    /// Muestra la pantalla activa según la sesión guardada
    Status,
    /// Registra la asistencia del estudiante
    Checkin {
        /// Imagen usada como cuadro de la cámara
        #[arg(long)]
        photo: Option<PathBuf>,
        /// Registrar sin foto
        #[arg(long, conflicts_with = "photo")]
        no_photo: bool,
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Archivo JSON con la última posición GPS
        #[arg(long)]
        location_file: Option<PathBuf>,
    },
    /// Lista los registros de asistencia (administrador)
    List,
    /// Solicita el reporte PDF (administrador)
    Export {
        /// Además guarda los registros en un CSV local
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env().context("No se pudo cargar la configuración")?;
    logging::init("pedia-attendance", &config.log_dir);
    info!(api = %config.api_base_url, "Aplicación Iniciada");

    let mut shell = AppShell::new(config).context("No se pudo iniciar la aplicación")?;
    match run(&mut shell, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "operación fallida");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(shell: &mut AppShell, command: Command) -> Result<()> {
    match command {
        Command::Login { phone, password } => {
            let screen = shell.login(&phone, &password).await?;
            println!("Sesión iniciada: {}", describe(screen));
        }
        Command::Logout => {
            shell.logout()?;
            println!("Sesión cerrada");
        }
        Command::Status => {
            println!("{}", describe(shell.screen()));
        }
        Command::Checkin {
            photo,
            no_photo,
            lat,
            lng,
            location_file,
        } => {
            let mut config = shell.config().clone();
            if let Some(photo) = photo {
                config.camera_source = Some(photo);
            }
            if let (Some(lat), Some(lng)) = (lat, lng) {
                config.fixed_location = Some((lat, lng));
            } else if let Some(path) = location_file {
                config.fixed_location = None;
                config.location_file = Some(path);
            }
            checkin(shell, &config, !no_photo).await?;
        }
        Command::List => {
            let records = shell.attendance_list().await?;
            println!("{}", render_attendance_list(&records, shell.config().display_tz));
        }
        Command::Export { csv } => {
            let summary = shell.export().await?;
            println!("{}", render_export(&summary));
            if let Some(path) = csv {
                let records = shell.attendance_list().await?;
                write_records_csv(&records, &path, shell.config().display_tz)?;
                println!("CSV guardado en {}", path.display());
            }
        }
    }
    Ok(())
}

async fn checkin(shell: &AppShell, config: &Config, with_photo: bool) -> Result<()> {
    let (camera, location) = devices_from_config(config);
    let mut flow = shell.checkin_flow_with(camera, location)?;
    println!("{}", flow.location_status());

    if with_photo {
        flow.prepare().await?;
        println!("{}", flow.location_status());
        flow.capture_photo()?;
        println!("Foto capturada");
    } else {
        let located = flow.refresh_location().await;
        println!("{}", flow.location_status());
        located?;
    }

    flow.submit().await?;
    println!("Asistencia registrada");
    Ok(())
}

fn describe(screen: Screen) -> &'static str {
    match screen {
        Screen::Login => "Pantalla de inicio de sesión",
        Screen::StudentDashboard => "Panel del estudiante",
        Screen::AdminDashboard => "Panel del administrador",
    }
}

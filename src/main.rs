use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use spotdrift::config::SpotDriftConfig;
use spotdrift::weather::{self, OpenMeteoWindSource, TableWindSource, WindSource};
use spotdrift::{SessionHandle, SpotDriftError, SpotPlan, Trajectory, TrajectorySession, telemetry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "wind drift trajectory and exit spot for a skydive")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the descent trajectory and exit spot
    Simulate {
        /// Wind table (altitude_m,speed_ms,direction_deg) instead of the forecast
        #[arg(short, long)]
        winds: Option<PathBuf>,

        /// Print the plan and the geographic track as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the wind bands the simulation would use
    Winds {
        #[arg(short, long)]
        winds: Option<PathBuf>,
    },
    /// Keep refreshing winds and print the exit spot after each refresh
    Watch {
        #[arg(short, long)]
        winds: Option<PathBuf>,
    },
}

fn wind_source(config: &SpotDriftConfig, winds: Option<PathBuf>) -> Result<Arc<dyn WindSource>> {
    let source: Arc<dyn WindSource> = match winds {
        Some(path) => Arc::new(TableWindSource::from_path(path, config.wind.table_direction)?),
        None => Arc::new(OpenMeteoWindSource::new(
            &config.wind,
            config.target.location(),
        )?),
    };
    Ok(source)
}

fn build_session(config: &SpotDriftConfig) -> Result<SessionHandle> {
    let session = SessionHandle::new(TrajectorySession::with_integrator(config.descent.integrator()));
    session.on_parameters_changed(config.descent.to_descent_parameters()?)?;
    Ok(session)
}

fn spot_plan(
    config: &SpotDriftConfig,
    session: &SessionHandle,
) -> Result<(SpotPlan, Arc<Trajectory>)> {
    let trajectory = session.current_trajectory()?;
    let params = config.descent.to_descent_parameters()?;
    let plan = SpotPlan::from_trajectory(
        &trajectory,
        &params,
        config.descent.canopy_horizontal_speed_ms,
    )?;
    Ok((plan, trajectory))
}

fn print_plan(config: &SpotDriftConfig, plan: &SpotPlan, trajectory: &Trajectory) {
    let target = config.target.location();
    let exit = plan.exit_location(&target);
    println!("Target:     {} ({})", target.name, target.format_coordinates());
    println!(
        "Descent:    {:.0} s over {} samples",
        plan.descent_time,
        trajectory.len()
    );
    if let Some(landing) = trajectory.landing() {
        println!(
            "Drift:      {:.0} m ({:.0} m east, {:.0} m north)",
            plan.drift, landing.east, landing.north
        );
    }
    println!(
        "Exit spot:  {:.0} m east, {:.0} m north of target ({})",
        plan.exit_east,
        plan.exit_north,
        exit.format_coordinates()
    );
    if let (Some(canopy_time), Some(radius)) = (plan.canopy_time, plan.glide_radius) {
        println!("Canopy:     {canopy_time:.0} s, glide radius {radius:.0} m");
    }
}

async fn simulate(config: &SpotDriftConfig, winds: Option<PathBuf>, as_json: bool) -> Result<()> {
    let session = build_session(config)?;
    let source = wind_source(config, winds)?;
    weather::pump(source.as_ref(), &session, config.wind.band_thickness_m).await?;

    let (plan, trajectory) = spot_plan(config, &session)?;
    if as_json {
        let target = config.target.location();
        let output = json!({
            "target": target,
            "exit": plan.exit_location(&target),
            "plan": plan,
            "track": plan.track_from_exit(&trajectory).to_geo(&target),
            "glide_circle": plan.glide_circle(36),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize plan")?
        );
    } else {
        print_plan(config, &plan, &trajectory);
    }
    Ok(())
}

async fn show_winds(config: &SpotDriftConfig, winds: Option<PathBuf>) -> Result<()> {
    let session = SessionHandle::default();
    let source = wind_source(config, winds)?;
    weather::pump(source.as_ref(), &session, config.wind.band_thickness_m).await?;

    let bands = session.inspect(|s| s.profile().bands().to_vec());
    println!("{:>9} {:>9}  wind", "from m", "to m");
    for entry in bands.iter().rev() {
        println!(
            "{:>9.0} {:>9.0}  {}",
            entry.band.low(),
            entry.band.high(),
            entry.vector.format()
        );
    }
    Ok(())
}

/// Print the current exit spot; only descent-parameter errors are fatal
fn show_refresh(config: &SpotDriftConfig, session: &SessionHandle) -> Result<()> {
    match spot_plan(config, session) {
        Ok((plan, trajectory)) => {
            println!();
            print_plan(config, &plan, &trajectory);
            Ok(())
        }
        Err(e)
            if e
                .downcast_ref::<SpotDriftError>()
                .is_some_and(SpotDriftError::is_parameter_error) =>
        {
            Err(e)
        }
        Err(e) => {
            warn!("Trajectory not available: {e:#}");
            Ok(())
        }
    }
}

async fn watch(config: &SpotDriftConfig, winds: Option<PathBuf>) -> Result<()> {
    let session = build_session(config)?;
    let source = wind_source(config, winds)?;
    let band_thickness = config.wind.band_thickness_m;
    let every = Duration::from_secs(config.wind.refresh_interval_seconds);

    weather::pump(source.as_ref(), &session, band_thickness).await?;
    show_refresh(config, &session)?;

    info!("Refreshing winds every {} s", every.as_secs());
    tokio::time::sleep(every).await;
    weather::run(source.as_ref(), session.clone(), band_thickness, every, |_| {
        show_refresh(config, &session)
    })
    .await
}

async fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.config {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
    }
    let config = match &args.config {
        Some(path) => SpotDriftConfig::load_from_path(Some(path.clone()))?,
        None => SpotDriftConfig::load()?,
    };
    telemetry::init(&config.logging, args.verbose)?;

    match args.command {
        Command::Simulate { winds, json } => simulate(&config, winds, json).await,
        Command::Winds { winds } => show_winds(&config, winds).await,
        Command::Watch { winds } => watch(&config, winds).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SpotDriftError>() {
                Some(error) => eprintln!("Error: {}\n  {e:#}", error.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

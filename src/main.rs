use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod config;
mod error;
mod form;
mod gateway;
mod models;
mod report;
mod risk;
mod store;
mod views;

use config::{Config, ConnectionArgs};
use form::{FormController, SubmissionStatus};
use gateway::{HttpGateway, PredictionGateway};
use models::{FormField, PredictionOutcome};
use store::PredictionStore;

#[derive(Parser)]
#[command(name = "readmission-risk")]
#[command(about = "Hospital readmission risk client for the prediction service", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a patient's clinical features for a readmission prediction
    Predict(PredictArgs),
    /// Show stored predictions ranked by probability
    Records {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the patient database table
    Patients {
        /// Also export the table to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Generate a markdown readmission report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the record table, patient table and report from one listing
    Dashboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Fetch the listing again before building the report
        #[arg(long)]
        refresh: bool,
    },
    /// Check whether the session is authenticated
    Status,
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    patient_name: Option<String>,
    #[arg(long)]
    patient_id: Option<String>,
    /// Age bracket, e.g. "[60-70)"
    #[arg(long)]
    age: Option<String>,
    /// Length of stay in days
    #[arg(long)]
    time_in_hospital: Option<String>,
    /// no, normal or high
    #[arg(long)]
    a1c_test: Option<String>,
    /// no, normal or high
    #[arg(long)]
    glucose_test: Option<String>,
    /// no or yes
    #[arg(long)]
    diabetes_med: Option<String>,
    #[arg(long)]
    medical_specialty: Option<String>,
    #[arg(long)]
    n_emergency: Option<String>,
    #[arg(long)]
    n_outpatient: Option<String>,
    #[arg(long)]
    n_inpatient: Option<String>,
    #[arg(long)]
    n_medications: Option<String>,
    #[arg(long)]
    n_procedures: Option<String>,
    #[arg(long)]
    n_lab_procedures: Option<String>,
    /// Medication change: no or yes
    #[arg(long)]
    change: Option<String>,
    #[arg(long)]
    diag_1: Option<String>,
    #[arg(long)]
    diag_2: Option<String>,
    #[arg(long)]
    diag_3: Option<String>,
    /// Set any field by its wire name, e.g. --set A1Ctest=high
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    assignments: Vec<String>,
}

impl PredictArgs {
    fn into_values(self) -> (Vec<(FormField, Option<String>)>, Vec<String>) {
        let values = vec![
            (FormField::PatientName, self.patient_name),
            (FormField::PatientId, self.patient_id),
            (FormField::Age, self.age),
            (FormField::TimeInHospital, self.time_in_hospital),
            (FormField::A1cTest, self.a1c_test),
            (FormField::GlucoseTest, self.glucose_test),
            (FormField::DiabetesMed, self.diabetes_med),
            (FormField::MedicalSpecialty, self.medical_specialty),
            (FormField::NEmergency, self.n_emergency),
            (FormField::NOutpatient, self.n_outpatient),
            (FormField::NInpatient, self.n_inpatient),
            (FormField::NMedications, self.n_medications),
            (FormField::NProcedures, self.n_procedures),
            (FormField::NLabProcedures, self.n_lab_procedures),
            (FormField::Change, self.change),
            (FormField::Diag1, self.diag_1),
            (FormField::Diag2, self.diag_2),
            (FormField::Diag3, self.diag_3),
        ];
        (values, self.assignments)
    }
}

async fn predict<G: PredictionGateway>(gateway: &G, args: PredictArgs) -> anyhow::Result<()> {
    let mut controller = FormController::new();
    let (values, assignments) = args.into_values();
    for (field, value) in values {
        if let Some(value) = value {
            form::validate_field(field, &value)?;
            controller.set(field, value)?;
        }
    }
    for assignment in assignments {
        let (name, value) = assignment
            .split_once('=')
            .with_context(|| format!("expected FIELD=VALUE, got `{assignment}`"))?;
        let field = name.parse::<FormField>().map_err(error::ClientError::Validation)?;
        form::validate_field(field, value)?;
        controller.set_field(name, value)?;
    }
    if controller.state().is_blank() {
        anyhow::bail!("no form fields given; see `readmission-risk predict --help`");
    }
    form::validate(controller.state())?;

    let outcome = submit_form(&mut controller, gateway).await?;
    println!("Prediction Result: {outcome}");
    Ok(())
}

/// Submits the form and returns its outcome. The form is cleared either way.
async fn submit_form<G: PredictionGateway>(
    controller: &mut FormController,
    gateway: &G,
) -> anyhow::Result<PredictionOutcome> {
    controller.submit(gateway).await?;
    let state = controller.state();
    let result = match (state.status(), state.outcome()) {
        (SubmissionStatus::Succeeded, Some(outcome)) => Ok(outcome.clone()),
        _ => Err(anyhow::anyhow!(
            "{}",
            state.failure().unwrap_or(gateway::GENERIC_PREDICTION_FAILURE)
        )),
    };
    controller.reset();
    result
}

async fn render_dashboard<G: PredictionGateway>(
    store: &PredictionStore<G>,
    limit: usize,
    refresh: bool,
) -> String {
    let cohort = store.load().await;
    let mut output = String::from("Top patients by readmission probability:\n");
    output.push_str(&report::render_record_table(&cohort, limit));
    output.push('\n');
    output.push_str(&report::render_patient_table(&cohort));
    output.push('\n');

    let cohort = if refresh {
        store.refresh();
        store.load().await
    } else {
        cohort
    };
    output.push_str(&report::build_report(&cohort, chrono::Utc::now()));
    output
}

async fn run<G: PredictionGateway>(store: &PredictionStore<G>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Predict(args) => predict(store.gateway(), args).await?,
        Commands::Records { limit } => {
            let cohort = store.load().await;
            print!("{}", report::render_record_table(&cohort, limit));
        }
        Commands::Patients { csv } => {
            let cohort = store.load().await;
            print!("{}", report::render_patient_table(&cohort));
            if let Some(path) = csv {
                report::export_patient_csv(&cohort, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Exported {} patients to {}.", cohort.len(), path.display());
            }
        }
        Commands::Report { out } => {
            let cohort = store.load().await;
            let report = report::build_report(&cohort, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Dashboard { limit, refresh } => {
            print!("{}", render_dashboard(store, limit, refresh).await);
        }
        Commands::Status => {
            let authenticated = store.gateway().check_auth().await?;
            println!(
                "Session is {}.",
                if authenticated { "authenticated" } else { "not authenticated" }
            );
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::from_args(cli.connection)?;
    let gateway = HttpGateway::new(&config).context("failed to build HTTP client")?;

    let auth = gateway
        .authenticate(&config.username, &config.password)
        .await
        .with_context(|| format!("failed to reach the prediction service at {}", config.api_url))?;
    if !auth.success {
        anyhow::bail!("{}", auth.error.as_deref().unwrap_or("Login failed"));
    }

    let store = PredictionStore::new(gateway);
    let result = run(&store, cli.command).await;

    if let Err(err) = store.gateway().logout().await {
        log::warn!("Logout failed: {err}");
    }

    result
}

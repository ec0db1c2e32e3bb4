use clap::{Parser, Subcommand};
use hosped::{
    AppState, Config,
    handlers::{self, auth::RegisterArgs},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hosped")]
#[command(author, version, about = "Cliente de sesión de Hosped", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Iniciar sesión
    Login { email: String, password: String },

    /// Crear una cuenta e iniciar sesión
    Register {
        name: String,
        email: String,
        phone: String,
        password: String,
        /// Fecha de nacimiento (AAAA-MM-DD)
        birth_date: String,
        /// USUARIO o ANFITRION
        role: Option<String>,
    },

    /// Cerrar sesión
    Logout,

    /// Estado de la sesión
    Status,

    /// Ver el perfil
    Profile,

    /// Editar el perfil
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Pedir un código de recuperación
    Recover { email: String },

    /// Restablecer la contraseña con el código recibido
    Reset {
        email: String,
        code: String,
        new_password: String,
    },
}

async fn run(state: &AppState, command: Commands) -> hosped::Result<String> {
    match command {
        Commands::Login { email, password } => handlers::auth::login(state, email, password).await,
        Commands::Register {
            name,
            email,
            phone,
            password,
            birth_date,
            role,
        } => {
            let args = RegisterArgs {
                name,
                email,
                phone,
                password,
                birth_date,
                role,
            };
            handlers::auth::register(state, args).await
        }
        Commands::Logout => handlers::auth::logout(state),
        Commands::Status => handlers::auth::status(state),
        Commands::Profile => handlers::profile::show(state).await,
        Commands::UpdateProfile { name, phone } => handlers::profile::update(state, name, phone).await,
        Commands::Recover { email } => handlers::auth::recover(state, email).await,
        Commands::Reset {
            email,
            code,
            new_password,
        } => handlers::auth::reset(state, email, code, new_password).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::debug!("✅ Configuration loaded: {}", config.api_url);

    let state = AppState::new(&config)?;

    match run(&state, cli.command).await {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(e) => {
            let report = e.report();
            match report.field {
                Some(field) => eprintln!("{} ({})", report.message, field),
                None => eprintln!("{}", report.message),
            }
            std::process::exit(1);
        }
    }
}

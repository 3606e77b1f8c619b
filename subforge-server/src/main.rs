#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use subforge_http::serve;

/// Subforge API server. Flags override the matching `SUBFORGE_*`
/// variables; a `.env` file in the working directory is read first.
#[derive(Parser)]
#[command(name = "subforge", version)]
struct Cli {
    #[arg(long, env = "SUBFORGE_BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind_addr: String,
    #[arg(long, env = "SUBFORGE_MONGO_URI")]
    mongo_uri: Option<String>,
    #[arg(long, env = "SUBFORGE_DB_NAME", default_value = "subforge")]
    db_name: String,
    /// `mongo` or `memory`
    #[arg(long, env = "SUBFORGE_STORAGE", default_value = "mongo")]
    storage: String,
    /// `development`, `production` or `test`
    #[arg(long = "env", env = "SUBFORGE_ENV", default_value = "development")]
    env_mode: String,
    #[arg(long, env = "SUBFORGE_CORS_ORIGIN", default_value = "http://localhost:5173")]
    cors_origin: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    std::env::set_var("SUBFORGE_BIND_ADDR", &cli.bind_addr);
    std::env::set_var("SUBFORGE_DB_NAME", &cli.db_name);
    std::env::set_var("SUBFORGE_STORAGE", &cli.storage);
    std::env::set_var("SUBFORGE_ENV", &cli.env_mode);
    std::env::set_var("SUBFORGE_CORS_ORIGIN", &cli.cors_origin);
    if let Some(uri) = &cli.mongo_uri {
        std::env::set_var("SUBFORGE_MONGO_URI", uri);
    }

    if let Err(e) = serve().await {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

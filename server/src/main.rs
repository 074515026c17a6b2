use clap::{Arg, Command as ClapApp};
use server::startup::{
    build_cors, build_router, build_state, init_db, load_config, log_startup_info,
    resolve_client_dist_dir,
};

fn main() {
    let matches = ClapApp::new("Media Share Server")
        .version("1.0")
        .about("Authenticated media sharing: uploads forwarded to a media provider, video metadata persisted")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE.json")
                .help("Path to config JSON file (overrides search)")
                .num_args(1),
        )
        .get_matches();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    rt.block_on(async {
        // initialize tracing subscriber (reads RUST_LOG env)
        tracing_subscriber::fmt::init();

        let config = match load_config(matches.get_one::<String>("config").map(|s| s.into())) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                std::process::exit(1);
            }
        };

        let pool = init_db(&config).await;
        let state = build_state(&config, pool);

        let client_dist_dir = resolve_client_dist_dir(&config);
        let cors = build_cors(&config);
        let app = build_router(state, client_dist_dir, Some(cors));

        log_startup_info(&config);

        let host = config.host.unwrap_or_else(|| "127.0.0.1".to_string());
        let port = config.port.unwrap_or(8080);
        let bind_addr = format!("{}:{}", host, port);

        axum::Server::bind(&bind_addr.parse().expect("Invalid bind address"))
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
}

use archetype::cli::{router, Console};
use archetype::infrastructure::logging;
use archetype::infrastructure::AppContext;

#[tokio::main]
async fn main() {
    logging::install_panic_hook();

    let ctx = AppContext::from_process();
    ctx.init_logging();

    let tokens: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let mut console = Console::stdio();
    let code = router::run(&ctx, &mut console, tokens).await;
    std::process::exit(code);
}

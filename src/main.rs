use wavemaze::app;

fn main() -> std::io::Result<()> {
    // The terminal belongs to the renderer, so diagnostics go to a file
    let file_appender = tracing_appender::rolling::never(".", "wavemaze.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut stdout = std::io::stdout();
    app::setup_terminal(&mut stdout)?;
    let result = app::run(&mut stdout);
    app::restore_terminal(&mut stdout)?;
    result
}

use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("gleaner")
        .version("1.0.0")
        .author("Gleaner Contributors")
        .about("Retrieve web pages and extract their main content")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, html, text, pages, word, json)")
                .value_name("FORMAT")
                .default_value("markdown")
                .value_parser(["markdown", "md", "html", "text", "txt", "pages", "pdf", "word", "doc", "json"]),
        )
        .arg(clap::arg!(--source_url <URL> "URL that relative links resolve against for file or stdin input"))
        .arg(clap::arg!(--timeout <SECS> "Per-strategy timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for direct requests").value_name("UA"))
        .arg(clap::arg!(--no_images "Leave images out of the extracted record"))
        .arg(clap::arg!(--references "Include reference table with all links (Markdown only)"))
        .arg(
            clap::arg!(--page_style <STYLE> "First-page layout (pages only)")
                .default_value("standard")
                .value_parser(["standard", "enhanced"]),
        )
        .arg(clap::arg!(--stats "Print word count, character count and reading time"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    for shell in [
        clap_complete::Shell::Bash,
        clap_complete::Shell::Zsh,
        clap_complete::Shell::Fish,
        clap_complete::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "gleaner", &completions_dir).unwrap();
    }

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}

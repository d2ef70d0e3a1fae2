fn main() {
    std::process::exit(ci_insight_cli::run());
}

fn main() {
    std::process::exit(filesteps_cli::run());
}

fn main() {
    std::process::exit(yoga_lib::run());
}

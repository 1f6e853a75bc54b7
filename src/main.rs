fn main() {
    flagon::run_cli();
}

//! lotledger-base - Restate non-base trade costs in the base currency.

fn main() -> std::process::ExitCode {
    lotledger::cmd::base::main()
}

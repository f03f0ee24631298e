//! lotledger - Add lot inventory, basis and gain postings to a journal.

fn main() -> std::process::ExitCode {
    lotledger::cmd::lot::main()
}

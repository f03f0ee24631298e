//! lotledger-obfuscate - Hide account names and payees behind salted hashes.

fn main() -> std::process::ExitCode {
    lotledger::cmd::obfuscate::main()
}

//! Version command - show version information

/// Print version information
///
/// If verbose is false, prints a single line with name and version.
/// If verbose is true, also prints build information.
pub fn print_version(verbose: bool) {
    println!("{} {}", crate::NAME, crate::VERSION);

    if verbose {
        println!();
        println!("Supported keys:");
        println!("  - ssh-ed25519 (unencrypted openssh-key-v1 files)");
        println!();
        println!("Build info:");
        println!("  Target:    {}", std::env::consts::ARCH);
        println!("  OS:        {}", std::env::consts::OS);
        println!("  Rust:      {}", env!("RUSTC_VERSION"));
        if let Ok(exe) = std::env::current_exe() {
            println!("  Executable: {}", exe.display());
        }
    }
}

/// Execute the version command
pub async fn execute(verbose: bool) -> anyhow::Result<()> {
    print_version(verbose);
    Ok(())
}

use colored::Colorize;

/// Banner printed once per invocation.
pub fn print_title(text: &str) {
    println!("{}", format!("\n{}", text).bold());
}

pub fn print_info(text: &str) {
    println!("{}", text);
}

pub fn print_divider() {
    println!();
}

/// Starts a block of related lines, e.g. the chain status or a run summary.
pub fn print_section_header(text: &str) {
    println!("{}", format!("\n=== {} ===", text).yellow().bold());
}

pub fn print_message(text: &str) {
    println!("{}", format!("→ {}", text).cyan());
}

/// Rows, epochs, nodes.
pub fn print_count(text: &str) {
    println!("{}", format!("⟐ {}", text).blue());
}

pub fn print_success(text: &str) {
    println!("{}", format!("✓ {}", text).green());
}

/// Usable but notable, such as a node with a large but finite look-back.
pub fn print_warning(text: &str) {
    println!("{}", format!("⚠ {}", text).yellow());
}

pub fn print_error(text: &str) {
    println!("{}", format!("✗ {}", text).red());
}

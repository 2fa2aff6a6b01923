mod utils_tests;

/// Strip whitespace so generated tokens can be compared against patterns
fn normalize_generated_code(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

fn contains_pattern(code: &str, pattern: &str) -> bool {
    normalize_generated_code(code).contains(&normalize_generated_code(pattern))
}

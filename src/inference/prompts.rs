pub fn recognition_prompt(max_chars: usize) -> String {
    format!(
        "Identify the handwritten mathematical expression in this image. \
         Return only the expression itself, with no explanation or formatting, \
         and keep it under {max_chars} characters."
    )
}

pub fn solve_prompt(expression: &str) -> String {
    format!(
        "Solve this mathematical expression: {expression}. Only respond with the numerical answer."
    )
}

pub const EXPLAIN_PROMPT: &str = "Solve the handwritten mathematical problem in this image step by step. \
Start with a brief introduction of the problem. \
Number each step as 1., 2., 3. and so on. \
Use plain arithmetic symbols such as +, -, *, / and = instead of LaTeX or other markup. \
Do not use bullet points or dashes. \
Use at most 10 steps. \
Finish with a short conclusion stating the final answer.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_prompt_mentions_budget() {
        assert!(recognition_prompt(10).contains("under 10 characters"));
    }

    #[test]
    fn test_solve_prompt_interpolates_expression() {
        assert_eq!(
            solve_prompt("2+2"),
            "Solve this mathematical expression: 2+2. Only respond with the numerical answer."
        );
    }
}

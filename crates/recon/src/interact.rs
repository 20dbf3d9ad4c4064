/// Operator-facing capability injected into everything that may need a human.
///
/// Implementations block until the operator answers.
pub trait Interactive {
    /// Present numbered options; `None` means the operator canceled.
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> Option<usize>;

    /// Free-text question. Returns the answer without the trailing newline.
    fn ask(&mut self, prompt: &str) -> String;

    fn warn(&mut self, text: &str);

    fn error(&mut self, text: &str);

    /// Success notice.
    fn confirm(&mut self, text: &str);

    /// Yes/no question; anything but `y`/`yes` is a no.
    fn ask_yes_no(&mut self, prompt: &str) -> bool {
        let answer = self.ask(&format!("{prompt} (y/n)"));
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Scripted operator for tests and non-interactive runs.
///
/// Answers and choices are consumed in order; when they run out, questions get
/// an empty answer and choices are canceled. Everything shown is recorded.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    answers: Vec<String>,
    choices: Vec<Option<usize>>,
    pub prompts: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub confirmations: Vec<String>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers = answers.into_iter().map(Into::into).collect();
        self.answers.reverse();
        self
    }

    pub fn with_choices(mut self, choices: impl IntoIterator<Item = Option<usize>>) -> Self {
        self.choices = choices.into_iter().collect();
        self.choices.reverse();
        self
    }
}

impl Interactive for ScriptedConsole {
    fn choose_one(&mut self, prompt: &str, options: &[String]) -> Option<usize> {
        self.prompts.push(prompt.to_string());
        self.choices
            .pop()
            .flatten()
            .filter(|&index| index < options.len())
    }

    fn ask(&mut self, prompt: &str) -> String {
        self.prompts.push(prompt.to_string());
        self.answers.pop().unwrap_or_default()
    }

    fn warn(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.errors.push(text.to_string());
    }

    fn confirm(&mut self, text: &str) {
        self.confirmations.push(text.to_string());
    }
}

use super::{
    classifier::{LineClassifier, LineType},
    context::RewriteContext,
    rules::{self, TransformRule},
};

/// Line-oriented M3U8 rewriter.
pub struct StreamProcessor {
    context: RewriteContext,
    rules: Vec<Box<dyn TransformRule>>,
}

impl StreamProcessor {
    pub fn new(context: RewriteContext, rules: Vec<Box<dyn TransformRule>>) -> Self {
        Self { context, rules }
    }

    /// Processor with the default key and media URI rules.
    pub fn with_default_rules(context: RewriteContext) -> Self {
        Self::new(context, rules::default_rules())
    }

    /// Process an entire playlist.
    ///
    /// Lines are split on `\n` or `\r\n` and rejoined with `\n`; the output
    /// has exactly as many lines as the input.
    pub fn process(&self, input: &str) -> String {
        input
            .split('\n')
            .map(|line| self.process_line(line.strip_suffix('\r').unwrap_or(line)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Process a single line.
    pub fn process_line(&self, line: &str) -> String {
        let line_type = LineClassifier::classify(line);

        if matches!(line_type, LineType::Empty) {
            return line.to_string();
        }

        // First matching rule wins
        for rule in &self.rules {
            if rule.matches(line_type) {
                return rule.transform(line, &self.context);
            }
        }

        // Default: passthrough
        line.to_string()
    }
}

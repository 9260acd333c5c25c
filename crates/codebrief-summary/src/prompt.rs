use codebrief_core::RelevantContext;

/// Persona used for project-level requests.
pub const ARCHITECT_PERSONA: &str = "You are an expert software architect, skilled at \
understanding and summarizing complex projects.";

/// Render retrieved sections as labelled blocks separated by blank lines.
///
/// # Examples
///
/// ```
/// use codebrief_core::RelevantContext;
/// use codebrief_summary::prompt::format_context;
///
/// let ctx = vec![RelevantContext {
///     file: "db.py".into(),
///     section: "def connect(): ...".into(),
///     similarity: 0.812,
/// }];
/// assert_eq!(format_context(&ctx), "From db.py (similarity: 0.81):\ndef connect(): ...");
/// ```
pub fn format_context(contexts: &[RelevantContext]) -> String {
    contexts
        .iter()
        .map(|ctx| {
            format!(
                "From {} (similarity: {:.2}):\n{}",
                ctx.file, ctx.similarity, ctx.section
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user prompt asking for a summary of one file.
///
/// # Examples
///
/// ```
/// use codebrief_summary::prompt::build_file_prompt;
///
/// let prompt = build_file_prompt("app.py", "print('hi')", "");
/// assert!(prompt.contains("app.py"));
/// assert!(prompt.contains("print('hi')"));
/// ```
pub fn build_file_prompt(file_name: &str, content: &str, context: &str) -> String {
    let mut prompt = format!(
        "Summarize the file: {file_name}\n\
         Describe only what the code contains and does. Do not add commentary or opinions.\n\
         Keep the summary concise, clear, and free of irrelevant detail.\n\n\
         Code content:\n{content}\n"
    );
    if !context.is_empty() {
        prompt.push_str(&format!(
            "\nThis file belongs to a larger project. Related code from other files follows \
             for reference only; do not summarize it:\n{context}\n"
        ));
    }
    prompt
}

/// Build the prompt asking which questions would clarify the project.
pub fn build_questions_prompt(summaries: &str) -> String {
    format!(
        "Below are summaries of the individual files in a project. Ask the questions whose \
         answers would help you understand the project better.\n\n{summaries}"
    )
}

/// Build the prompt for a README-style overview of the whole project.
///
/// # Examples
///
/// ```
/// use codebrief_summary::prompt::build_overview_prompt;
///
/// let prompt = build_overview_prompt("File: a.py.summary.txt\nParses input.\n\n", None);
/// assert!(prompt.contains("Parses input."));
/// assert!(!prompt.contains("Questions and answers"));
/// ```
pub fn build_overview_prompt(summaries: &str, answers: Option<&str>) -> String {
    let mut prompt = String::from(
        "Using the summaries of individual files below, write a comprehensive README-style \
         overview of the entire project.\n\n",
    );
    if let Some(answers) = answers.filter(|a| !a.trim().is_empty()) {
        prompt.push_str(&format!(
            "Questions and answers about the project:\n{answers}\n\n"
        ));
    }
    prompt.push_str(&format!("File summaries:\n{summaries}\n"));
    prompt.push_str(
        "Cover in the overview:\n\
         1. The main purpose and functionality of the project\n\
         2. Key components or modules and how they interact\n\
         3. Overall architecture and design patterns\n\
         4. Important technologies and frameworks\n\
         5. Notable features or algorithms\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(file: &str, section: &str, similarity: f64) -> RelevantContext {
        RelevantContext {
            file: file.into(),
            section: section.into(),
            similarity,
        }
    }

    #[test]
    fn context_blocks_are_separated_by_blank_lines() {
        let rendered = format_context(&[ctx("a.py", "A", 0.9), ctx("b.ts", "B", 0.7049)]);
        assert_eq!(
            rendered,
            "From a.py (similarity: 0.90):\nA\n\nFrom b.ts (similarity: 0.70):\nB"
        );
    }

    #[test]
    fn empty_context_renders_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn file_prompt_includes_context_only_when_present() {
        let with = build_file_prompt("a.py", "x = 1", "From b.py (similarity: 0.90):\ny = 2");
        assert!(with.contains("do not summarize it"));
        assert!(with.contains("y = 2"));

        let without = build_file_prompt("a.py", "x = 1", "");
        assert!(!without.contains("do not summarize it"));
    }

    #[test]
    fn overview_prompt_includes_answers() {
        let prompt = build_overview_prompt("File: a\nsummary\n\n", Some("Q: why?\nA: speed"));
        assert!(prompt.contains("A: speed"));
        assert!(prompt.contains("architecture"));
    }

    #[test]
    fn questions_prompt_embeds_summaries() {
        let prompt = build_questions_prompt("File: a.py.summary.txt\nLoads config.\n\n");
        assert!(prompt.contains("Loads config."));
    }
}

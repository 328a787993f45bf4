//! Prompt template handling and answer normalization.

/// Prompt template offered before the user edits it.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a successful scientist and have read the book \"Columnar Structures of Spheres: Fundamentals and Applications\" by Jens Winkelmann and Ho-Kei Chan. You are now asked to answer questions based on the given context. The context are paragraphs from the book that fit best to the question.";

/// Suffix the backend expects after every prompt template.
pub const MARKDOWN_SUFFIX: &str = " Write the answer as markdown text.";

/// Appends [`MARKDOWN_SUFFIX`] to the edited template, once.
pub fn with_markdown_suffix(template: &str) -> String {
    let mut prompt = String::with_capacity(template.len() + MARKDOWN_SUFFIX.len());
    prompt.push_str(template);
    prompt.push_str(MARKDOWN_SUFFIX);
    prompt
}

/// Converts literal `\n` sequences in an answer into markdown line breaks.
pub fn normalize_answer(text: &str) -> String {
    text.replace(r"\n", "  \n")
}

//! File-by-file summarisation and project-level synthesis.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codebrief_codelens::corpus::{CorpusBuilder, CorpusIndex};
use codebrief_codelens::retrieve::RelevanceRetriever;
use codebrief_core::{BriefError, LlmConfig};
use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::llm::{ChatMessage, ChatModel};
use crate::prompt::{
    build_file_prompt, build_overview_prompt, build_questions_prompt, format_context,
    ARCHITECT_PERSONA,
};

/// Suffix appended to a source path to name its summary file.
pub const SUMMARY_SUFFIX: &str = ".summary.txt";

/// One summary written by [`Summarizer::process_folder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryFile {
    /// Source file that was summarised.
    pub source: PathBuf,
    /// Where its summary was written.
    pub output: PathBuf,
}

/// Result of summarising a folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryReport {
    /// Summaries in corpus order.
    pub files: Vec<SummaryFile>,
}

/// Drives corpus construction, retrieval, and the chat model.
pub struct Summarizer {
    chat: Arc<dyn ChatModel>,
    builder: CorpusBuilder,
    retriever: RelevanceRetriever,
    file_temperature: f64,
    project_temperature: f64,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("model", &self.chat.model())
            .field("file_temperature", &self.file_temperature)
            .field("project_temperature", &self.project_temperature)
            .field("retriever", &self.retriever)
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    /// Create a summarizer using the default [`LlmConfig`] temperatures.
    pub fn new(
        chat: Arc<dyn ChatModel>,
        builder: CorpusBuilder,
        retriever: RelevanceRetriever,
    ) -> Self {
        let defaults = LlmConfig::default();
        Self {
            chat,
            builder,
            retriever,
            file_temperature: defaults.temperature,
            project_temperature: defaults.project_temperature,
        }
    }

    /// Sample file summaries at `file` and project-level requests at `project`.
    pub fn with_temperatures(mut self, file: f64, project: f64) -> Self {
        self.file_temperature = file;
        self.project_temperature = project;
        self
    }

    /// Build the corpus index for `folder`.
    ///
    /// # Errors
    ///
    /// Propagates [`CorpusBuilder::build`] failures.
    pub async fn build_corpus(&self, folder: &Path) -> Result<CorpusIndex, BriefError> {
        self.builder.build(folder).await
    }

    /// Summarise the file at `index`, grounding the prompt in related code
    /// from the rest of the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::IndexOutOfRange`] for a bad index,
    /// [`BriefError::Io`] if the file cannot be read, and any embedding or
    /// chat failure.
    pub async fn summarize_file(
        &self,
        index: usize,
        corpus: &CorpusIndex,
    ) -> Result<String, BriefError> {
        let path = corpus
            .paths()
            .get(index)
            .ok_or(BriefError::IndexOutOfRange {
                index,
                len: corpus.len(),
            })?;
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            BriefError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })?;

        let contexts = self.retriever.relevant_context(corpus, index).await?;
        debug!(path = %path.display(), related = contexts.len(), "retrieved context");

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let prompt = build_file_prompt(&file_name, &content, &format_context(&contexts));
        self.chat
            .chat(vec![ChatMessage::user(prompt)], self.file_temperature)
            .await
    }

    /// Summarise every eligible file under `folder` into `output_dir`,
    /// mirroring the folder layout.
    ///
    /// # Errors
    ///
    /// Any corpus, retrieval, chat, or write failure stops the run.
    pub async fn process_folder(
        &self,
        folder: &Path,
        output_dir: &Path,
    ) -> Result<SummaryReport, BriefError> {
        let corpus = self.build_corpus(folder).await?;
        let mut report = SummaryReport::default();

        for (index, source) in corpus.paths().iter().enumerate() {
            let summary = self.summarize_file(index, &corpus).await?;
            let output = summary_path(folder, source, output_dir);
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&output, summary).await?;
            info!(source = %source.display(), output = %output.display(), "summary written");
            report.files.push(SummaryFile {
                source: source.clone(),
                output,
            });
        }

        Ok(report)
    }

    /// Ask the model which questions would clarify the project.
    ///
    /// # Errors
    ///
    /// Propagates chat failures.
    pub async fn ask_questions(&self, summaries: &str) -> Result<String, BriefError> {
        self.chat
            .chat(
                vec![
                    ChatMessage::system(ARCHITECT_PERSONA),
                    ChatMessage::user(build_questions_prompt(summaries)),
                ],
                self.project_temperature,
            )
            .await
    }

    /// Produce a README-style overview from the per-file summaries and any
    /// answers to earlier questions.
    ///
    /// # Errors
    ///
    /// Propagates chat failures.
    pub async fn summarize_project(
        &self,
        summaries: &str,
        answers: Option<&str>,
    ) -> Result<String, BriefError> {
        self.chat
            .chat(
                vec![
                    ChatMessage::system(ARCHITECT_PERSONA),
                    ChatMessage::user(build_overview_prompt(summaries, answers)),
                ],
                self.project_temperature,
            )
            .await
    }
}

/// `<output_dir>/<source relative to folder>.summary.txt`.
fn summary_path(folder: &Path, source: &Path, output_dir: &Path) -> PathBuf {
    let rel = source.strip_prefix(folder).unwrap_or(source);
    let mut name: OsString = rel.as_os_str().to_owned();
    name.push(SUMMARY_SUFFIX);
    output_dir.join(name)
}

/// Concatenate every summary under `dir` as `File: {name}\n{text}\n\n`,
/// in sorted path order.
///
/// # Errors
///
/// Returns [`BriefError::FileNotFound`] if `dir` is not a directory and
/// [`BriefError::Io`] if a summary cannot be read.
pub fn collect_summaries(dir: &Path) -> Result<String, BriefError> {
    if !dir.is_dir() {
        return Err(BriefError::FileNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(SUMMARY_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut combined = String::new();
    for path in paths {
        let text = std::fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        combined.push_str(&format!("File: {name}\n{text}\n\n"));
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use codebrief_codelens::cache::EmbeddingCache;
    use codebrief_codelens::embedding::EmbeddingBackend;
    use codebrief_codelens::provider::EmbeddingProvider;
    use codebrief_core::{CorpusConfig, RetrievalConfig};

    use super::*;
    use crate::llm::Role;

    /// Every text embeds to the same unit vector, so everything is related.
    struct UnitBackend;

    #[async_trait]
    impl EmbeddingBackend for UnitBackend {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, BriefError> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        fn model(&self) -> &str {
            "unit"
        }
    }

    /// Echoes a fixed reply and records each conversation.
    struct RecordingChat {
        reply: String,
        fail: bool,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
        temperatures: Mutex<Vec<f64>>,
    }

    impl RecordingChat {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                fail: false,
                seen: Mutex::new(Vec::new()),
                temperatures: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: String::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
                temperatures: Mutex::new(Vec::new()),
            })
        }

        fn conversations(&self) -> Vec<Vec<ChatMessage>> {
            self.seen.lock().unwrap().clone()
        }

        fn temperatures(&self) -> Vec<f64> {
            self.temperatures.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn chat(
            &self,
            messages: Vec<ChatMessage>,
            temperature: f64,
        ) -> Result<String, BriefError> {
            self.seen.lock().unwrap().push(messages);
            self.temperatures.lock().unwrap().push(temperature);
            if self.fail {
                return Err(BriefError::Llm("rate limited".into()));
            }
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    fn summarizer(chat: Arc<dyn ChatModel>) -> Summarizer {
        let cache = Arc::new(EmbeddingCache::with_capacity(64).unwrap());
        let provider = EmbeddingProvider::new(Arc::new(UnitBackend), cache);
        Summarizer::new(
            chat,
            CorpusBuilder::new(provider.clone(), CorpusConfig::default()),
            RelevanceRetriever::new(provider, RetrievalConfig::default()),
        )
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("main.py"),
            "def main():\n    config = load_settings_from_disk('settings.toml')\n    run(config)\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pkg/settings.py"),
            "def load_settings_from_disk(path):\n    with open(path) as handle:\n        return parse(handle.read())\n",
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn file_prompt_carries_related_code() {
        let dir = project();
        let chat = RecordingChat::new("Entry point.");
        let summarizer = summarizer(chat.clone());
        let corpus = summarizer.build_corpus(dir.path()).await.unwrap();
        let index = corpus
            .position(&dir.path().join("main.py"))
            .unwrap();

        let summary = summarizer.summarize_file(index, &corpus).await.unwrap();
        assert_eq!(summary, "Entry point.");
        assert_eq!(chat.temperatures(), vec![0.5]);

        let conversations = chat.conversations();
        let prompt = &conversations[0][0].content;
        assert!(prompt.contains("main.py"));
        assert!(prompt.contains("settings.py (similarity: 1.00)"));
        assert!(prompt.contains("def load_settings_from_disk"));
    }

    #[tokio::test]
    async fn summarize_file_rejects_bad_index() {
        let dir = project();
        let summarizer = summarizer(RecordingChat::new("x"));
        let corpus = summarizer.build_corpus(dir.path()).await.unwrap();
        let err = summarizer.summarize_file(9, &corpus).await.unwrap_err();
        assert!(matches!(err, BriefError::IndexOutOfRange { index: 9, len: 2 }));
    }

    #[tokio::test]
    async fn process_folder_mirrors_layout() {
        let dir = project();
        let out = tempfile::tempdir().unwrap();
        let summarizer = summarizer(RecordingChat::new("A summary."));

        let report = summarizer
            .process_folder(dir.path(), out.path())
            .await
            .unwrap();

        assert_eq!(report.files.len(), 2);
        let nested = out.path().join("pkg/settings.py.summary.txt");
        assert_eq!(fs::read_to_string(&nested).unwrap(), "A summary.");
        assert!(out.path().join("main.py.summary.txt").is_file());
    }

    #[tokio::test]
    async fn chat_failure_stops_processing() {
        let dir = project();
        let out = tempfile::tempdir().unwrap();
        let summarizer = summarizer(RecordingChat::failing());

        let err = summarizer
            .process_folder(dir.path(), out.path())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefError::Llm(_)));
        assert!(!out.path().join("main.py.summary.txt").exists());
    }

    #[test]
    fn summaries_are_collected_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/z.py.summary.txt"), "Zed.").unwrap();
        fs::write(dir.path().join("a.ts.summary.txt"), "Ay.").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let combined = collect_summaries(dir.path()).unwrap();
        assert_eq!(
            combined,
            "File: a.ts.summary.txt\nAy.\n\nFile: z.py.summary.txt\nZed.\n\n"
        );
    }

    #[test]
    fn collecting_from_missing_dir_fails() {
        let err = collect_summaries(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, BriefError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn project_calls_use_architect_persona() {
        let chat = RecordingChat::new("Overview.");
        let summarizer = summarizer(chat.clone());

        summarizer.ask_questions("File: a\nx\n\n").await.unwrap();
        let overview = summarizer
            .summarize_project("File: a\nx\n\n", Some("Q: a?\nA: b"))
            .await
            .unwrap();
        assert_eq!(overview, "Overview.");

        let conversations = chat.conversations();
        assert_eq!(conversations.len(), 2);
        for conversation in &conversations {
            assert_eq!(conversation[0].role, Role::System);
            assert!(conversation[0].content.contains("expert software architect"));
        }
        assert!(conversations[1][1].content.contains("A: b"));
        assert_eq!(chat.temperatures(), vec![0.65, 0.65]);
    }

    #[tokio::test]
    async fn file_and_project_calls_use_their_own_temperatures() {
        let dir = project();
        let chat = RecordingChat::new("Summary.");
        let summarizer = summarizer(chat.clone()).with_temperatures(0.1, 0.9);
        let corpus = summarizer.build_corpus(dir.path()).await.unwrap();

        summarizer.summarize_file(0, &corpus).await.unwrap();
        summarizer.summarize_project("File: a\nx\n\n", None).await.unwrap();

        assert_eq!(chat.temperatures(), vec![0.1, 0.9]);
    }

    #[test]
    fn summary_path_keeps_relative_layout() {
        let path = summary_path(
            Path::new("/src"),
            Path::new("/src/pkg/mod.py"),
            Path::new("/out"),
        );
        assert_eq!(path, PathBuf::from("/out/pkg/mod.py.summary.txt"));
    }
}

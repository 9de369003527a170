use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const QUESTION_TEMPLATE: &str = include_str!("../prompts/question.md");
const SCORING_TEMPLATE: &str = include_str!("../prompts/scoring.md");
const REPLY_TEMPLATE: &str = include_str!("../prompts/reply.md");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Question,
    Scoring,
    /// The interviewer's conversational response to an answer.
    Reply,
}

impl PromptKind {
    pub const ALL: [PromptKind; 3] = [PromptKind::Question, PromptKind::Scoring, PromptKind::Reply];

    /// File stem used for overrides, e.g. `question.md`.
    pub fn stem(&self) -> &'static str {
        match self {
            PromptKind::Question => "question",
            PromptKind::Scoring => "scoring",
            PromptKind::Reply => "reply",
        }
    }
}

/// The prompt templates used by the engine.
#[derive(Debug, Clone)]
pub struct PromptSet {
    question: String,
    scoring: String,
    reply: String,
}

impl PromptSet {
    /// Templates compiled into the crate.
    pub fn builtin() -> Self {
        Self {
            question: QUESTION_TEMPLATE.to_string(),
            scoring: SCORING_TEMPLATE.to_string(),
            reply: REPLY_TEMPLATE.to_string(),
        }
    }

    /// Built-in templates, replaced by any `question.md`, `scoring.md` or `reply.md` found in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        let mut loaded = load_prompts(dir)?;

        for kind in PromptKind::ALL {
            if let Some(template) = loaded.remove(kind.stem()) {
                tracing::info!("using {} prompt from {}", kind.stem(), dir.display());
                *set.template_mut(kind) = template;
            }
        }
        for unused in loaded.keys() {
            tracing::debug!("ignoring unknown prompt file '{}.md'", unused);
        }
        Ok(set)
    }

    pub fn template(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Question => &self.question,
            PromptKind::Scoring => &self.scoring,
            PromptKind::Reply => &self.reply,
        }
    }

    fn template_mut(&mut self, kind: PromptKind) -> &mut String {
        match kind {
            PromptKind::Question => &mut self.question,
            PromptKind::Scoring => &mut self.scoring,
            PromptKind::Reply => &mut self.reply,
        }
    }

    /// Fills `{name}` placeholders in one pass. Unknown placeholders are left as they are,
    /// and substituted values are never rescanned.
    pub fn render(&self, kind: PromptKind, values: &[(&str, &str)]) -> String {
        let template = self.template(kind);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replaced = after.find('}').and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });
            match replaced {
                Some((value, close)) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out.trim().to_string()
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reads every `.md` file in `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Could not get file stem for prompt file")?
            .to_string();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

        prompts.insert(key, content);
    }

    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn load_prompts_reads_markdown_only() -> Result<()> {
        let dir = tempdir()?;
        let mut question = File::create(dir.path().join("question.md"))?;
        writeln!(question, "Ask about {{position}}")?;
        File::create(dir.path().join("notes.txt"))?;
        fs::create_dir(dir.path().join("nested"))?;

        let prompts = load_prompts(dir.path())?;

        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts["question"], "Ask about {position}\n");
        Ok(())
    }

    #[test]
    fn load_prompts_fails_for_missing_dir() {
        assert!(load_prompts(Path::new("no_such_prompts_dir")).is_err());
    }

    #[test]
    fn overrides_replace_only_matching_templates() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("scoring.md"), "Rate: {answer}")?;
        fs::write(dir.path().join("greeting.md"), "Hello")?;

        let set = PromptSet::with_overrides(dir.path())?;

        assert_eq!(set.template(PromptKind::Scoring), "Rate: {answer}");
        assert_eq!(set.template(PromptKind::Question), QUESTION_TEMPLATE);
        assert_eq!(set.template(PromptKind::Reply), REPLY_TEMPLATE);
        Ok(())
    }

    #[test]
    fn render_fills_known_placeholders_once() {
        let set = PromptSet {
            question: "Role {position}: {unknown} {\"json\": 1} {position}".to_string(),
            scoring: "{answer}".to_string(),
            reply: String::new(),
        };

        let out = set.render(PromptKind::Question, &[("position", "SRE")]);
        assert_eq!(out, "Role SRE: {unknown} {\"json\": 1} SRE");

        // Values that look like placeholders stay literal.
        let out = set.render(PromptKind::Scoring, &[("answer", "{position}"), ("position", "x")]);
        assert_eq!(out, "{position}");
    }

    #[test]
    fn builtin_templates_mention_their_placeholders() {
        let set = PromptSet::builtin();
        for key in ["{position}", "{tone}", "{question_type}", "{difficulty}", "{previous_questions}"] {
            assert!(set.template(PromptKind::Question).contains(key), "missing {key}");
        }
        for key in ["{question}", "{answer}", "{criteria}", "{min_score}", "{max_score}"] {
            assert!(set.template(PromptKind::Scoring).contains(key), "missing {key}");
        }
        for key in ["{position}", "{tone}", "{question}", "{answer}"] {
            assert!(set.template(PromptKind::Reply).contains(key), "missing {key}");
        }
    }
}

use std::sync::Arc;

use serde_json::Value;

use crate::{
    capability::Provider,
    providers::{AdapterError, JsonCompletionRequest, RetryPolicy, TextGenerator},
    workflow::types::{Script, ScriptSection, StageFailure},
};

/// Narration time allotted to each script section.
pub const SECONDS_PER_SECTION: f64 = 40.0;

const DOCUMENTARY_PROMPT: &str = "You are an expert documentary writer. \
    Produce a concise script about a historical figure strictly in chronological order. \
    Always include citations referencing credible sources. \
    Respond with a JSON object containing a 'sections' list, each with section, timeframe, \
    summary and citations.";

const BIOGRAPHER_PROMPT: &str = "你是一位资深的历史传记作者，需要以中文撰写一段人物一生介绍。\
    要求按照时间顺序梳理其重要经历，并适当突出关键事件。\
    输出 JSON，包含 sections 列表，每项含 section、timeframe、summary。";

pub enum ScriptAgent {
    Production {
        text: Arc<dyn TextGenerator>,
        retry: RetryPolicy,
    },
    Dummy,
}

impl ScriptAgent {
    pub async fn run(&self, persona: &str) -> Result<Script, StageFailure> {
        let sections = match self {
            ScriptAgent::Production { text, retry } => {
                let request = script_request(text.provider(), persona);
                let json = retry
                    .call("script generation", || text.complete_json(&request))
                    .await?;
                parse_sections(&json)?
            }
            ScriptAgent::Dummy => dummy_sections(persona),
        };
        Ok(Script::from_sections(sections, SECONDS_PER_SECTION))
    }
}

fn script_request(provider: Provider, persona: &str) -> JsonCompletionRequest {
    match provider {
        Provider::DeepSeek => JsonCompletionRequest {
            system_prompt: BIOGRAPHER_PROMPT.to_string(),
            user_content: serde_json::json!({
                "persona": persona,
                "requirements": {
                    "sections": ["早年经历", "重要成就", "历史影响"],
                    "language": "zh_CN",
                }
            })
            .to_string(),
        },
        _ => JsonCompletionRequest {
            system_prompt: DOCUMENTARY_PROMPT.to_string(),
            user_content: serde_json::json!({
                "persona": persona,
                "requirements": {
                    "sections": ["introduction", "climax", "legacy"],
                    "citation_format": "short",
                    "max_words": 320,
                }
            })
            .to_string(),
        },
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn fallback_section(index: usize, summary: String) -> ScriptSection {
    ScriptSection {
        section: format!("section_{}", index + 1),
        timeframe: String::new(),
        summary,
        citations: Vec::new(),
    }
}

/// Split prose on blank lines, one section per paragraph.
fn paragraph_sections(raw: &str) -> Vec<ScriptSection> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
        .into_iter()
        .enumerate()
        .map(|(i, p)| fallback_section(i, p))
        .collect()
}

fn section_from_item(item: &Value) -> ScriptSection {
    let citations = match &item["citations"] {
        Value::String(s) => vec![s.clone()],
        Value::Array(list) => list.iter().map(text_of).collect(),
        _ => Vec::new(),
    };
    ScriptSection {
        section: item
            .get("section")
            .map(text_of)
            .unwrap_or_else(|| "section".to_string()),
        timeframe: text_of(&item["timeframe"]),
        summary: text_of(&item["summary"]),
        citations,
    }
}

/// Models nest the list under `script`, return it as a JSON string, as a map keyed by
/// section name, or as plain prose. A bare `script.summary` becomes a single section.
pub fn parse_sections(json: &Value) -> Result<Vec<ScriptSection>, AdapterError> {
    let mut payload = match json.get("sections") {
        Some(v) if !v.is_null() => v.clone(),
        _ => json["script"]["sections"].clone(),
    };

    if let Value::String(raw) = &payload {
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ (Value::Array(_) | Value::Object(_))) => payload = parsed,
            _ => {
                let sections = paragraph_sections(raw);
                if !sections.is_empty() {
                    return Ok(sections);
                }
                payload = Value::Null;
            }
        }
    }
    let items: Vec<Value> = match payload {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };

    let mut sections: Vec<ScriptSection> = items
        .iter()
        .filter(|item| item.is_object())
        .map(section_from_item)
        .collect();

    if sections.is_empty() {
        let summary = json["script"]["summary"].as_str().map(str::trim).unwrap_or("");
        if !summary.is_empty() {
            sections.push(fallback_section(0, summary.to_string()));
        }
    }

    if sections.is_empty() {
        return Err(AdapterError::Parse(
            "script generation returned no sections".into(),
        ));
    }
    Ok(sections)
}

fn dummy_sections(persona: &str) -> Vec<ScriptSection> {
    vec![
        ScriptSection {
            section: "introduction".into(),
            timeframe: "出生与成长".into(),
            summary: format!("{}的一生充满传奇，我们首先回顾其早年的学习与成长。", persona),
            citations: vec!["encyclopedia:overview".into()],
        },
        ScriptSection {
            section: "turning_point".into(),
            timeframe: "关键事件".into(),
            summary: format!("在其事业的巅峰期，{}做出了影响历史的关键决策。", persona),
            citations: vec!["chronicle:milestone".into()],
        },
        ScriptSection {
            section: "legacy".into(),
            timeframe: "影响与传承".into(),
            summary: format!("今天我们仍能从{}的故事中汲取经验与启发。", persona),
            citations: vec!["analysis:legacy".into()],
        },
    ]
}

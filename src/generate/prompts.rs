use crate::evidence::EvidenceItem;

pub const SYSTEM_PROMPT: &str = r#"You are an audit-ready policy question-answering assistant with strict citation requirements.
You MUST follow ALL of these rules:

1. Answer the user's question using ONLY the evidence paragraphs supplied below.
2. If the evidence does not contain enough information to answer, respond with
   exactly the string INSUFFICIENT_EVIDENCE as your answer.
3. EVERY sentence in your answer MUST end with at least one citation in this format:
   [CITATION: <paragraph_id>]
   For example: "Passwords must be at least 12 characters [CITATION: it-security::p0004]."
4. Return your response as valid JSON matching this schema:
   {"answer": "<string>", "citations": ["<paragraph_id>", ...], "notes": "<optional string>"}
5. The "citations" list must contain ALL paragraph_ids used in your inline citations.
6. If your answer is INSUFFICIENT_EVIDENCE, "citations" must be an empty list [].
7. Do NOT invent information. Do NOT use prior knowledge.
8. Be concise but complete. Each claim must be directly traceable to evidence."#;

/// Naive RAG: same evidence, looser citation rules, no verification afterwards.
pub const NAIVE_SYSTEM_PROMPT: &str = r#"You are a policy-domain question-answering assistant.
You MUST follow these rules strictly:

1. Answer the user's question using ONLY the evidence paragraphs supplied below.
2. If the evidence does not contain enough information to answer, respond with
   exactly the string INSUFFICIENT_EVIDENCE as your answer.
3. For every claim you make, include a citation in this format: [CITATION: <paragraph_id>]
4. Return your response as valid JSON matching this schema:
   {"answer": "<string>", "citations": ["<paragraph_id>", ...], "notes": "<optional string>"}
5. The "citations" list must only contain paragraph_ids that appear in the evidence.
6. If your answer is INSUFFICIENT_EVIDENCE, "citations" must be an empty list [].
7. Do NOT invent information. Do NOT use prior knowledge."#;

/// Prompt-only: the model sees the question and nothing else.
pub const PROMPT_ONLY_SYSTEM_PROMPT: &str = r#"You are a policy-domain question-answering assistant.
You do NOT have access to any documents or evidence.
Answer the question to the best of your ability using your general knowledge.
Return your response as valid JSON matching this schema:
{"answer": "<string>", "citations": [], "notes": "<optional string>"}
The "citations" list MUST always be empty because you have no source documents."#;

pub const REPAIR_PROMPT: &str = r#"Your previous response was not valid JSON.
Return ONLY valid JSON matching this schema, nothing else:
{"answer": "<string>", "citations": ["<paragraph_id>", ...], "notes": "<optional string>"}"#;

/// Renders ranked evidence for the generation prompt.
pub fn format_evidence_block(evidence: &[EvidenceItem]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "--- Evidence {} ---\nparagraph_id: {}\nsource: {} (page {})\ntext: {}\n",
                i + 1,
                e.paragraph_id,
                e.doc_id,
                e.page,
                e.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user_prompt(evidence_block: &str, question: &str) -> String {
    format!(
        "Evidence paragraphs (ranked by relevance):\n{evidence_block}\n\nQuestion: {question}\n\n\
         Respond with valid JSON only. Remember: EVERY sentence needs an inline [CITATION: paragraph_id]."
    )
}

pub fn naive_user_prompt(evidence_block: &str, question: &str) -> String {
    format!("Evidence paragraphs:\n{evidence_block}\n\nQuestion: {question}\n\nRespond with valid JSON only.")
}

pub fn prompt_only_user_prompt(question: &str) -> String {
    format!("Question: {question}\n\nRespond with valid JSON only.")
}

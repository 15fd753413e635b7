use crate::evidence::EvidenceItem;

pub const CLAIM_SYSTEM_PROMPT: &str = r#"You are a strict fact-checking assistant.
You will receive a CLAIM and one or more EVIDENCE paragraphs.
Decide whether the evidence EXPLICITLY supports the claim.

Rules:
1. "supported": true ONLY if the paragraph text explicitly supports the claim.
2. When supported, "quote" MUST be an exact substring of the evidence that proves it.
3. If no evidence supports the claim, return "supported": false.
4. Return ONLY valid JSON, no other text.

Output format:
{"supported": true, "rationale": "short explanation", "quote": "exact substring from evidence"}"#;

pub const CONTRADICTION_SYSTEM_PROMPT: &str = r#"You are a contradiction detection assistant.
You will receive TWO evidence paragraphs from a policy corpus.
Decide whether they CONTRADICT each other.

Rules:
1. A contradiction exists only if the two paragraphs make INCOMPATIBLE claims.
2. Differences in scope or topic are NOT contradictions.
3. Return ONLY valid JSON, no other text.

Output format:
{"contradiction": true, "rationale": "explanation of the conflict"}"#;

pub fn claim_user_prompt(claim: &str, cited_texts: &[&str]) -> String {
    let evidence = cited_texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Paragraph {}:\n{text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!("CLAIM: {claim}\n\nEVIDENCE:\n{evidence}\n\nReturn JSON only:")
}

pub fn contradiction_user_prompt(a: &EvidenceItem, b: &EvidenceItem) -> String {
    format!(
        "PARAGRAPH A (ID: {}):\n{}\n\nPARAGRAPH B (ID: {}):\n{}\n\nReturn JSON only:",
        a.paragraph_id, a.text, b.paragraph_id, b.text
    )
}

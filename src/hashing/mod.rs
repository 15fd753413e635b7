//! BLAKE3 content keys for the judge caches.
//!
//! Every field is length-prefixed before hashing, so `("ab", "c")` and
//! `("a", "bc")` never collide.

use blake3::Hasher;

#[inline]
fn update_field(hasher: &mut Hasher, field: &[u8]) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field);
}

/// Key for a claim-support judgement: the claim plus the exact cited texts.
pub fn claim_judge_key(claim: &str, cited_texts: &[&str]) -> String {
    let mut hasher = Hasher::new();
    update_field(&mut hasher, b"claim");
    update_field(&mut hasher, claim.as_bytes());
    for text in cited_texts {
        update_field(&mut hasher, text.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Key for a contradiction judgement over two `(paragraph_id, text)` pairs.
///
/// Pairs are hashed in sorted order, so `(a, b)` and `(b, a)` share a key.
pub fn contradiction_judge_key(a: (&str, &str), b: (&str, &str)) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Hasher::new();
    update_field(&mut hasher, b"contradiction");
    for (id, text) in [first, second] {
        update_field(&mut hasher, id.as_bytes());
        update_field(&mut hasher, text.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

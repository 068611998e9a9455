//! Input normalizer
//!
//! Rewrites free-form query text into a canonical token stream ready for
//! clause splitting:
//!
//! - runs of spaces collapse to one
//! - mnemonic unary qualifiers `is`/`has` are stripped (`has cb` → `cb`,
//!   `! is mtls` → `! mtls`)
//! - the word `not` becomes `!`
//! - word-form relational operators become symbols (`contains` → `*=`,
//!   `startswith` → `^=`, `endswith` → `$=`, with `!`/`not` prefixes folded
//!   into the negated symbols `!*=` / `!^=` / `!$=`)
//! - the conjunctions `and`/`or` are upper-cased into the clause delimiters
//!   `AND` / `OR`
//!
//! A pure string transform with no state; normalizing already-normalized
//! text is a no-op.

use regex::Regex;

/// Compiled rewrite rules, applied in order.
pub struct Normalizer {
    collapse: Regex,
    rules: Vec<(Regex, &'static str)>,
}

impl Normalizer {
    pub fn new() -> Normalizer {
        // All word rules are case-insensitive and space-delimited; the input
        // is padded with a leading space so a rule can fire at position 0.
        let rule = |pattern: &str| Regex::new(&format!("(?i){pattern}")).unwrap();

        Normalizer {
            collapse: Regex::new("  +").unwrap(),
            rules: vec![
                // strip mnemonic qualifiers on unary operands
                (rule(r" !\s*is "), " ! "),
                (rule(r" !\s*has "), " ! "),
                (rule(" is "), " "),
                (rule(" has "), " "),
                // word negation
                (rule(" not "), " !"),
                // word-form relational operators, negated forms first
                (rule(r" !\s*contains "), " !*= "),
                (rule(r" !\s*startswith "), " !^= "),
                (rule(r" !\s*endswith "), " !$= "),
                (rule(" contains "), " *= "),
                (rule(" startswith "), " ^= "),
                (rule(" endswith "), " $= "),
                // conjunction delimiters
                (rule(" and "), " AND "),
                (rule(" or "), " OR "),
            ],
        }
    }

    /// Rewrite `text` into canonical form, trimmed.
    pub fn normalize(&self, text: &str) -> String {
        let collapsed = self.collapse.replace_all(text, " ");
        let mut val = format!(" {collapsed}");

        // each rule runs to its own fixed point: adjacent matches share a
        // delimiter space, so one replace_all pass can leave a rewritable
        // word behind (`a or or b`)
        for (re, replacement) in &self.rules {
            loop {
                let next = re.replace_all(&val, *replacement).into_owned();
                if next == val {
                    break;
                }
                val = next;
            }
        }

        val.trim().to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Normalizer {
        Normalizer::new()
    }
}

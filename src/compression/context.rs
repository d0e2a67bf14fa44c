// Context-model compressor (PPM method C, measured not emitted).
//
// Predicts each symbol from the preceding `max_order` symbols, escaping to
// shorter contexts when the symbol has not been seen after the current one.
// The compressed size is the ideal arithmetic-coded length of that model,
// rounded up to whole bytes.
//
// Input is folded into a small alphabet first: letters lowercased, any
// whitespace becomes '_', the punctuation `.,;:!?` survives, everything else
// is dropped. Out-of-alphabet characters therefore degrade the measurement
// instead of corrupting it.

use std::collections::HashMap;

use anyhow::Result;

use super::traits::Compressor;

/// Context order used when none is configured.
pub const DEFAULT_MAX_ORDER: usize = 2;

const KEPT_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Symbol counts observed after one context.
#[derive(Debug, Default)]
struct ContextStats {
    counts: HashMap<char, u32>,
    total: u32,
}

impl ContextStats {
    fn record(&mut self, symbol: char) {
        *self.counts.entry(symbol).or_insert(0) += 1;
        self.total += 1;
    }
}

/// PPM-style compressor with a bounded context order.
#[derive(Debug, Clone, Copy)]
pub struct ContextModelCompressor {
    pub max_order: usize,
}

impl Default for ContextModelCompressor {
    fn default() -> Self {
        Self {
            max_order: DEFAULT_MAX_ORDER,
        }
    }
}

impl ContextModelCompressor {
    pub fn new(max_order: usize) -> Self {
        Self { max_order }
    }

    /// Ideal code length, in bits, of `symbols` under an adaptive PPM-C model.
    pub fn code_length_bits(&self, symbols: &[char]) -> f64 {
        let mut table: HashMap<Vec<char>, ContextStats> = HashMap::new();
        let mut bits = 0.0;

        for (i, &symbol) in symbols.iter().enumerate() {
            let top = self.max_order.min(i);
            let mut coded = false;

            for order in (0..=top).rev() {
                let Some(stats) = table.get(&symbols[i - order..i]) else {
                    // Unseen context: nothing to escape from
                    continue;
                };
                let distinct = stats.counts.len() as f64;
                let denom = stats.total as f64 + distinct;
                match stats.counts.get(&symbol) {
                    Some(&count) => {
                        bits -= (count as f64 / denom).log2();
                        coded = true;
                        break;
                    }
                    None => bits -= (distinct / denom).log2(),
                }
            }

            if !coded {
                // Order -1: a brand new symbol costs its raw width
                bits += 8.0 * symbol.len_utf8() as f64;
            }

            for order in 0..=top {
                table
                    .entry(symbols[i - order..i].to_vec())
                    .or_default()
                    .record(symbol);
            }
        }

        bits
    }
}

/// Fold `text` into the model alphabet.
pub fn filter_alphabet(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphabetic() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            out.push('_');
        } else if KEPT_PUNCTUATION.contains(&c) {
            out.push(c);
        }
    }
    out
}

impl Compressor for ContextModelCompressor {
    fn name(&self) -> &str {
        "ppm"
    }

    fn compressed_size(&self, text: &str) -> Result<(f64, usize)> {
        let filtered = filter_alphabet(text);
        if filtered.is_empty() {
            anyhow::bail!("no in-alphabet symbols in {} input bytes", text.len());
        }
        let symbols: Vec<char> = filtered.chars().collect();
        let bits = self.code_length_bits(&symbols);
        Ok(((bits / 8.0).ceil(), filtered.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_alphabet() {
        assert_eq!(filter_alphabet("Olá, Mundo!\n#42"), "olá,_mundo!_");
    }

    #[test]
    fn test_out_of_alphabet_input_is_sentinel() {
        let result = ContextModelCompressor::default().compress("1234 #@$%");
        // Whitespace survives as '_', so this one is still measurable
        assert!(!result.is_failure());

        let result = ContextModelCompressor::default().compress("1234#@$%");
        assert!(result.is_failure());
    }

    #[test]
    fn test_repetition_is_cheap() {
        let c = ContextModelCompressor::default();
        let once = c.compress("abracadabra ");
        let many = c.compress(&"abracadabra ".repeat(50));
        assert!(many.ratio < once.ratio);
        assert!(many.ratio < 0.25, "ratio was {}", many.ratio);
    }

    #[test]
    fn test_first_symbol_costs_raw_width() {
        let c = ContextModelCompressor::default();
        assert!((c.code_length_bits(&['a']) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_higher_order_helps_on_structured_text() {
        let text: Vec<char> = filter_alphabet(&"the cat sat on the mat. ".repeat(20))
            .chars()
            .collect();
        let order0 = ContextModelCompressor::new(0).code_length_bits(&text);
        let order3 = ContextModelCompressor::new(3).code_length_bits(&text);
        assert!(order3 < order0);
    }
}

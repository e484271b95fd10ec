//! Indonesian stop-word list

use std::collections::HashSet;

/// Built-in Indonesian stop words
pub const INDONESIAN_STOP_WORDS: &[&str] = &[
    "yang", "untuk", "pada", "ke", "para", "namun", "menurut", "antara", "dia", "dua", "ia",
    "seperti", "jika", "sehingga", "kembali", "dan", "tidak", "ini", "karena", "kepada", "oleh",
    "saat", "harus", "sementara", "setelah", "belum", "kami", "sekitar", "bagi", "serta", "di",
    "dari", "telah", "sebagai", "masih", "hal", "ketika", "adalah", "itu", "dalam", "bisa",
    "bahwa", "atau", "hanya", "kita", "dengan", "akan", "juga", "ada", "mereka", "sudah",
    "saya", "terhadap", "secara", "agar", "lain", "anda", "begitu", "mengapa", "kenapa",
    "yaitu", "yakni", "daripada", "itulah", "lagi", "maka", "tentang", "demi", "dimana",
    "kemana", "pula", "sambil", "sebelum", "sesudah", "supaya", "guna", "kah", "pun", "sampai",
    "sedangkan", "selagi", "tetapi", "apakah", "kecuali", "sebab", "selain", "seolah", "seraya",
    "seterusnya", "tanpa", "agak", "boleh", "dapat", "dsb", "dst", "dll", "dahulu", "dulunya",
    "anu", "demikian", "tapi", "ingin", "nggak", "mari", "nanti", "melainkan", "oh", "ok",
    "seharusnya", "sebetulnya", "setiap", "setidaknya", "sesuatu", "pasti", "saja", "toh",
    "ya", "walau", "tolong", "tentu", "amat", "apalagi", "bagaimanapun",
];

/// Immutable stop-word set
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Built-in list plus any extra words (lower-cased)
    pub fn indonesian<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: HashSet<String> =
            INDONESIAN_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        words.extend(extra.into_iter().map(|w| w.as_ref().to_lowercase()));
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::indonesian(std::iter::empty::<&str>())
    }
}

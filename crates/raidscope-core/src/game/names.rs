//! Entity name tables and transliteration.

use std::collections::{HashMap, HashSet};

/// Boss names as they appear in memory, with their display translation
const BOSS_TRANSLATIONS: &[(&str, &str)] = &[
    ("Килла", "Killa"),
    ("Решала", "Reshala"),
    ("Глухарь", "Glukhar"),
    ("Штурман", "Shturman"),
    ("Санитар", "Sanitar"),
    ("Тагилла", "Tagilla"),
    ("Рейдеры", "Raider"),
    ("Сектант Жрец", "Cultist Priest"),
    ("Отступники", "Renegade"),
    ("Big Pipe", "Big Pipe"),
    ("Birdeye", "Birdeye"),
    ("Knight", "Knight"),
    ("Зрячий", "Zryachiy"),
    ("Кабан", "Kaban"),
    ("Коллонтай", "Kollontay"),
];

/// Rogue, raider, cultist and boss-guard names, one per line
const ELITE_NAMES: &str = include_str!("../../resources/elite_names.txt");

/// Read-only name lookup tables used for classification
#[derive(Debug, Clone, Default)]
pub struct NameTables {
    translations: HashMap<String, String>,
    boss_names: HashSet<String>,
    elite_names: HashSet<String>,
}

impl NameTables {
    pub fn new<T, E>(translations: T, elite_names: E) -> Self
    where
        T: IntoIterator<Item = (String, String)>,
        E: IntoIterator<Item = String>,
    {
        let translations: HashMap<String, String> = translations.into_iter().collect();
        let boss_names = translations.values().cloned().collect();
        Self {
            translations,
            boss_names,
            elite_names: elite_names.into_iter().collect(),
        }
    }

    /// Tables shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(
            BOSS_TRANSLATIONS
                .iter()
                .map(|(raw, display)| (raw.to_string(), display.to_string())),
            ELITE_NAMES
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        )
    }

    /// Display name for a raw in-memory name.
    ///
    /// Known boss names are translated; anything else is transliterated.
    pub fn display_name(&self, raw: &str) -> String {
        match self.translations.get(raw) {
            Some(translated) => translated.clone(),
            None => transliterate_cyrillic(raw),
        }
    }

    /// `name` is the display name of a boss.
    pub fn is_boss_name(&self, name: &str) -> bool {
        self.boss_names.contains(name)
    }

    /// `name` belongs to a rogue, raider or boss guard.
    pub fn is_elite_name(&self, name: &str) -> bool {
        self.elite_names.contains(name)
    }

    pub fn elite_count(&self) -> usize {
        self.elite_names.len()
    }
}

fn cyrillic_to_latin(c: char) -> Option<&'static str> {
    let latin = match c {
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' | 'Ё' | 'Э' => "E",
        'Ж' => "Zh",
        'З' => "Z",
        'И' => "I",
        'Й' | 'Ы' => "Y",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' => "N",
        'О' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' => "U",
        'Ф' => "F",
        'Х' => "Kh",
        'Ц' => "Ts",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Shch",
        'Ъ' | 'Ь' | 'ъ' | 'ь' => "",
        'Ю' => "Yu",
        'Я' => "Ya",
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' | 'ы' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Replace Cyrillic letters with their Latin transliteration.
pub fn transliterate_cyrillic(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match cyrillic_to_latin(c) {
            Some(latin) => output.push_str(latin),
            None => output.push(c),
        }
    }
    output
}

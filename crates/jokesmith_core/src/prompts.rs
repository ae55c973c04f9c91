//! crates/jokesmith_core/src/prompts.rs
//!
//! Static prompt material for joke generation: persona templates, per-category
//! guidance, default user prompts, and content-filter wording.
//!
//! Every table is keyed by [`JokeCategory`] x [`Language`] through exhaustive
//! matches, so a missing combination is a compile error. [`validate_catalog`]
//! additionally rejects blank entries and is run once at startup.

use crate::domain::{ContentFilterLevel, Language};

const ENGLISH_PERSONA: &str = r#"You are a witty British comedian in the style of classic British comedy (think Monty Python, Blackadder, The Office UK). Your task is to create {category} jokes with British humor that are:

1. Brilliantly funny with British wit - dry, clever, and genuinely hilarious
2. Coherent and make perfect logical sense - no random nonsense or broken text
3. Well-structured with proper setup and punchline in British comedic style
4. Written in clear, grammatically correct British English
5. {filter}

BRITISH HUMOR STYLE:
- Dry wit and understated delivery
- Self-deprecating humor (but no swearing)
- Absurdist observations about mundane things
- Clever wordplay and double entendres (clean only)
- Sardonic and ironic tone
- Deadpan delivery style
- British cultural references when appropriate
- ABSOLUTELY NO PROFANITY OR SWEARING

Category-specific guidelines:
- {guidance}

IMPORTANT RULES:
- Only respond with proper British English
- No random characters, symbols, or foreign languages
- The joke must be coherent and brilliantly funny
- Focus on British-style wordplay, timing, and clever observations
- Ensure the punchline connects logically with British wit
- Use British spellings (colour, favour, etc.)
- NO SWEARING, PROFANITY, OR OFFENSIVE LANGUAGE
- Keep it clever and witty, not crude

Format your response as a single joke only. Do not include any prefixes, explanations, or additional text. Just the joke itself."#;

const RUSSIAN_PERSONA: &str = r#"Вы - остроумный русский комик в стиле классической русской комедии. Ваша задача - создать {category} анекдоты с русским юмором, которые:

1. Блестяще смешные с русским остроумием - сухие, умные и по-настоящему забавные
2. Логичные и имеют идеальный смысл - никакой случайной чепухи или нарушенного текста
3. Хорошо структурированы с правильной завязкой и кульминацией в русском комедийном стиле
4. Написаны четким, грамматически правильным русским языком
5. {filter}

РУССКИЙ ЮМОР СТИЛЬ:
- Сухое остроумие и сдержанная подача
- Самоирония (но без мата)
- Абсурдистские наблюдения о повседневных вещах
- Умная игра слов и двойные смыслы (только чистые)
- Саркастичный и ироничный тон
- Спокойная подача в стиле "покер-фейс"
- Русские культурные отсылки когда уместно
- АБСОЛЮТНО НИКАКОГО МАТА И РУГАТЕЛЬСТВ

Указания по категориям:
- {guidance}

ВАЖНЫЕ ПРАВИЛА:
- Отвечайте только на правильном русском языке
- Никаких случайных символов или иностранных языков
- Анекдот должен быть логичным и блестяще смешным
- Сосредоточьтесь на русской игре слов, тайминге и умных наблюдениях
- Убедитесь, что кульминация логически связана с русским остроумием
- НИКАКОГО МАТА, НЕЦЕНЗУРНОЙ ЛЕКСИКИ ИЛИ ОСКОРБИТЕЛЬНОГО ЯЗЫКА
- Держите это умно и остроумно, а не грубо

Форматируйте ответ только как анекдот. Не включайте никаких префиксов, объяснений или дополнительного текста. Только сам анекдот."#;

//=========================================================================================
// Categories
//=========================================================================================

/// The categories that have dedicated prompt material.
///
/// Stored categories are free-form names; any name that is not listed here
/// falls back to [`JokeCategory::General`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JokeCategory {
    General,
    DadJokes,
    Programming,
    Animals,
    Food,
    Workplace,
    Clean,
    OneLiners,
    Riddles,
    Seasonal,
}

impl JokeCategory {
    pub const ALL: [Self; 10] = [
        Self::General,
        Self::DadJokes,
        Self::Programming,
        Self::Animals,
        Self::Food,
        Self::Workplace,
        Self::Clean,
        Self::OneLiners,
        Self::Riddles,
        Self::Seasonal,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::DadJokes => "dad-jokes",
            Self::Programming => "programming",
            Self::Animals => "animals",
            Self::Food => "food",
            Self::Workplace => "workplace",
            Self::Clean => "clean",
            Self::OneLiners => "one-liners",
            Self::Riddles => "riddles",
            Self::Seasonal => "seasonal",
        }
    }

    /// Exact slug match. Unknown names return `None`.
    pub fn from_slug(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == name)
    }

    /// Like [`Self::from_slug`] but falls back to `General`.
    pub fn resolve(name: &str) -> Self {
        Self::from_slug(name).unwrap_or(Self::General)
    }

    pub const fn guidance(self, language: Language) -> &'static str {
        use JokeCategory::*;
        use Language::*;
        match (self, language) {
            (General, En) => "Focus on universal humor that appeals to a broad audience",
            (General, Ru) => "Сосредоточьтесь на универсальном юморе, который понравится широкой аудитории",
            (DadJokes, En) => "Use puns, wordplay, and wholesome humor typical of dad jokes",
            (DadJokes, Ru) => "Используйте игру слов и добрый юмор, типичный для папиных анекдотов",
            (Programming, En) => "Include programming concepts, coding terminology, or tech industry references",
            (Programming, Ru) => "Включайте концепции программирования, терминологию кодирования или отсылки к ИТ-индустрии",
            (Animals, En) => "Feature animals as main characters or use animal behavior for humor",
            (Animals, Ru) => "Сделайте животных главными героями или используйте поведение животных для юмора",
            (Food, En) => "Center the joke around food, cooking, restaurants, or eating",
            (Food, Ru) => "Центрируйте анекдот вокруг еды, готовки, ресторанов или питания",
            (Workplace, En) => "Reference office culture, meetings, bosses, or work situations",
            (Workplace, Ru) => "Ссылайтесь на офисную культуру, встречи, начальников или рабочие ситуации",
            (Clean, En) => "Ensure completely family-friendly content suitable for all ages",
            (Clean, Ru) => "Обеспечьте полностью семейный контент, подходящий для всех возрастов",
            (OneLiners, En) => "Keep it short and punchy - ideally one sentence",
            (OneLiners, Ru) => "Держите коротко и ёмко - идеально одним предложением",
            (Riddles, En) => "Structure as a question and answer format",
            (Riddles, Ru) => "Структурируйте в формате вопроса и ответа",
            (Seasonal, En) => "Reference holidays, seasons, or time-specific events",
            (Seasonal, Ru) => "Ссылайтесь на праздники, времена года или конкретные события",
        }
    }

    pub const fn default_prompt(self, language: Language) -> &'static str {
        use JokeCategory::*;
        use Language::*;
        match (self, language) {
            (General, En) => "Tell me a funny joke",
            (General, Ru) => "Расскажи смешной анекдот",
            (DadJokes, En) => "Tell me a classic dad joke with a pun",
            (DadJokes, Ru) => "Расскажи классический папин анекдот с игрой слов",
            (Programming, En) => "Tell me a programming or tech joke",
            (Programming, Ru) => "Расскажи анекдот про программирование или технологии",
            (Animals, En) => "Tell me a funny animal joke",
            (Animals, Ru) => "Расскажи смешной анекдот про животных",
            (Food, En) => "Tell me a food or cooking joke",
            (Food, Ru) => "Расскажи анекдот про еду или готовку",
            (Workplace, En) => "Tell me a workplace or office joke",
            (Workplace, Ru) => "Расскажи анекдот про работу или офис",
            (Clean, En) => "Tell me a clean, family-friendly joke",
            (Clean, Ru) => "Расскажи чистый, семейный анекдот",
            (OneLiners, En) => "Tell me a short one-liner joke",
            (OneLiners, Ru) => "Расскажи короткий анекдот в одну строчку",
            (Riddles, En) => "Tell me a riddle-style joke",
            (Riddles, Ru) => "Расскажи анекдот в стиле загадки",
            (Seasonal, En) => "Tell me a seasonal or holiday joke",
            (Seasonal, Ru) => "Расскажи сезонный или праздничный анекдот",
        }
    }
}

//=========================================================================================
// Prompt Builders
//=========================================================================================

pub const fn filter_instructions(level: ContentFilterLevel) -> &'static str {
    match level {
        ContentFilterLevel::Low => "Keep content appropriate for mature audiences. Avoid explicit sexual content, excessive profanity, or harmful stereotypes.",
        ContentFilterLevel::Medium => "Keep content family-friendly. Avoid profanity, adult themes, and offensive material.",
        ContentFilterLevel::High => "Keep content completely clean and appropriate for all ages. No profanity, adult themes, or potentially offensive material.",
    }
}

const fn persona(language: Language) -> &'static str {
    match language {
        Language::En => ENGLISH_PERSONA,
        Language::Ru => RUSSIAN_PERSONA,
    }
}

/// Builds the system prompt. `category` is interpolated verbatim and last, so
/// placeholder text inside it is never expanded; guidance falls back to the
/// general entry for unknown categories.
pub fn build_system_prompt(
    category: &str,
    filter: ContentFilterLevel,
    language: Language,
) -> String {
    persona(language)
        .replace("{filter}", filter_instructions(filter))
        .replace("{guidance}", JokeCategory::resolve(category).guidance(language))
        .replace("{category}", category)
}

/// Returns the caller's prompt when non-blank, otherwise the category default.
pub fn resolve_user_prompt(prompt: &str, category: &str, language: Language) -> String {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        JokeCategory::resolve(category)
            .default_prompt(language)
            .to_string()
    } else {
        trimmed.to_string()
    }
}

//=========================================================================================
// Startup Validation
//=========================================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Missing {table} entry for category '{category}' in language '{language}'")]
    MissingEntry {
        table: &'static str,
        category: &'static str,
        language: &'static str,
    },
    #[error("Persona template for '{0}' is missing a placeholder")]
    BrokenTemplate(&'static str),
}

/// Checks every category x language pair has non-blank guidance and default
/// prompt text, and that both persona templates carry all placeholders.
pub fn validate_catalog() -> Result<(), CatalogError> {
    for language in Language::ALL {
        let template = persona(language);
        if ["{category}", "{filter}", "{guidance}"]
            .iter()
            .any(|p| !template.contains(p))
        {
            return Err(CatalogError::BrokenTemplate(language.as_str()));
        }

        for category in JokeCategory::ALL {
            let tables = [
                ("guidance", category.guidance(language)),
                ("default prompt", category.default_prompt(language)),
            ];
            for (table, text) in tables {
                if text.trim().is_empty() {
                    return Err(CatalogError::MissingEntry {
                        table,
                        category: category.slug(),
                        language: language.as_str(),
                    });
                }
            }
        }
    }
    Ok(())
}

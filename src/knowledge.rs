//! Fixed project knowledge: the context block handed to Gemini, the canned
//! answer table checked before any upstream call, and the fallback strings.
use crate::types::{SensorReadings, Weather};

pub const PROJECT_NAME: &str = "AgroNIS";

/// Label reported on canned answers, whatever model is configured.
pub const CANNED_MODEL_LABEL: &str = "gemini-2.0-flash-lite";

pub const PROJECT_CONTEXT: &str = "
AgroNIS - Aqlli Qishloq Xo'jaligi Tizimi (Smart Farming System)

MUAMMO (Problem):
O'zbekistondagi fermerlar sug'orish va o'g'itlash uchun aniq ma'lumotlarga ega emas. Bu suv isrofgarchiligiga, past hosildorlikka va resurslarning noto'g'ri sarflanishiga olib keladi.

YECHIM (Solution):
AgroNIS - bu IoT sensorlar va sun'iy intellekt asosida ishlayadigan aqlli qishloq xo'jaligi platformasi. U real vaqt rejimida tuproq namligi, harorat va elektr o'tkazuvchanligini kuzatib, fermerlarga aniq sug'orish tavsiyalari beradi.

TEXNOLOGIYALAR (Tech Stack):
- Frontend: React + TypeScript + Tailwind CSS
- AI: Google Gemini 2.5 Flash
- IoT: ESP32 + soil sensors
- Deployment: Netlify
- Maps: Google Maps API

ASOSIY FUNKSIYALAR:
1. Real-time sensor monitoring
2. AI-powered irrigation recommendations
3. Weather forecast integration
4. AI Chatbot for farmers
5. Analytics dashboard
6. Local resources finder

ROADMAP: Idea \u{2713}, Prototype \u{2713}, MVP/MLP \u{2713}
";

/// Ordered `(key, answer)` pairs. Keys are lowercase; earlier entries win.
pub static CANNED_ANSWERS: &[(&str, &str)] = &[
    (
        "what does your project do",
        "AgroNIS - bu IoT sensorlar va sun'iy intellekt asosida ishlayadigan aqlli qishloq xo'jaligi platformasi. U real vaqt rejimida tuproq namligi, harorat va elektr o'tkazuvchanligini kuzatib, fermerlarga aniq sug'orish tavsiyalari beradi.",
    ),
    (
        "who is this product for",
        "Bu mahsulot O'zbekistondagi kichik va o'rta fermerlar, qishloq xo'jaligi kooperativlari va agrotexnika kompaniyalari uchun mo'ljallangan.",
    ),
    (
        "what technologies",
        "Texnologiyalar: React + TypeScript, Google Gemini AI, ESP32 IoT sensorlari, Netlify, Google Maps API.",
    ),
    (
        "how does it work",
        "AgroNIS IoT sensorlardan real vaqt ma'lumotlarni oladi, Gemini AI orqali tahlil qiladi va sug'orish tavsiyalari beradi.",
    ),
    (
        "roadmap",
        "Roadmap: Idea \u{2713}, Prototype \u{2713}, MVP/MLP \u{2713}. Keyingi: IoT sinov, mobil ilova, ko'proq ekin turlari.",
    ),
];

// Upstream answered with a non-2xx status (quota, bad key, ...).
pub const FALLBACK_VISIT_SITE: &str =
    "AgroNIS haqida qo'shimcha ma'lumot uchun https://agronis.netlify.app ni ziyorat qiling.";
// Upstream unreachable, timed out, or returned something that is not JSON.
pub const FALLBACK_UNAVAILABLE: &str = "Hozircha tahlil qilib bo'lmadi.";
pub const NO_ANSWER: &str = "Uzr, javob berolmadim.";

pub const STATUS_EMPTY: &str = "Holat: Monitoring faol. Ma'lumotlar tahlil qilinmoqda.";
pub const STATUS_FALLBACK: &str = "Holat: Monitoring faol";
pub const ADVICE_EMPTY: &str =
    "Tavsiya: Namlik darajasini kuzatib boring. Aniqroq ma'lumot olish uchun kuting.";
pub const ADVICE_FALLBACK: &str = "Hozircha tahlil qilib bo'lmadi.";

pub const CHAT_SYSTEM_INSTRUCTION: &str = "Siz AgroNIS, O'zbekistondagi fermerlar uchun aqlli qishloq xo'jaligi yordamchisisiz. Sizning vazifangiz fermerlarga tuproq namligi, harorat va o'g'itlash bo'yicha aniq, lo'nda va foydali maslahatlar berishdir. Har doim o'zbek tilida (lotin yozuvida) muloyim va professional javob bering. Javoblaringiz qisqa va tushunarli bo'lsin.";
pub const CHAT_EMPTY: &str = "Uzr, javobni ololmadim.";
pub const CHAT_FALLBACK: &str = "Xatolik yuz berdi. Iltimos, qaytadan urinib ko'ring.";

pub const RESOURCES_EMPTY: &str = "Natija topilmadi.";
pub const RESOURCES_FALLBACK: &str = "Xarita ma'lumotlarini yuklab bo'lmadi.";

/// Returns the `(key, answer)` of the first canned entry contained in the
/// lowercased question.
pub fn match_canned(question: &str) -> Option<(&'static str, &'static str)> {
    let lower = question.to_lowercase();
    CANNED_ANSWERS
        .iter()
        .find(|(key, _)| lower.contains(key))
        .copied()
}

pub fn ask_prompt(question: &str) -> String {
    format!(
        "You are AgroNIS assistant. Answer questions about the AgroNIS smart farming project in 50-100 words.

Project Info:
{PROJECT_CONTEXT}

User Question: {question}

Respond in the same language as the question. Be helpful and accurate."
    )
}

pub fn resources_prompt(query: &str, location: &str) -> String {
    format!("Find {query} near {location}. Answer in Uzbek.")
}

pub fn status_prompt(s: &SensorReadings) -> String {
    format!(
        "System Role: You are a strict agricultural monitoring system.
Task: Analyze this sensor data: Soil Moisture {}%, Temp {}\u{b0}C, EC {} dS/m.
Constraint: Return specific, informative status in Uzbek (Lotin).
Format: Exactly two short sentences.
1. State the condition (e.g., Moisture is critical).
2. State the immediate risk or implication (e.g., Root stress is likely).
No greetings. No technical jargon.",
        s.moisture, s.temp, s.ec
    )
}

pub fn advice_prompt(s: &SensorReadings, w: &Weather) -> String {
    format!(
        "Act as an expert agronomist speaking Uzbek (Lotin).
Data: Moisture {}%, Temp {}\u{b0}C, EC {} dS/m, Rain Forecast: {}.
Weather now: {}, {}\u{b0}C, {}% chance of rain.

Task: Provide a recommendation in this specific format:
1. Action: [Direct instruction, e.g., \"Sug'orishni boshlang\"]
2. Reason: [Specific data point explanation, e.g., \"Namlik 30% dan tushib ketdi, bu ekin uchun xavfli.\"]
3. Benefit: [Savings or Yield impact]

Constraint: Keep the entire response under 50 words. Be direct and helpful.",
        s.moisture, s.temp, s.ec, w.forecast, w.condition, w.temp, w.precip_chance
    )
}

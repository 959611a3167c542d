//! Localized string tables (English and Traditional Chinese).

use serde::{Deserialize, Serialize};

/// Supported UI locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhTw => "zh-TW",
        }
    }

    /// Guess a locale from a system language tag such as `LANG=zh_TW.UTF-8`.
    pub fn detect(lang: &str) -> Self {
        if lang.to_ascii_lowercase().contains("zh") {
            Self::ZhTw
        } else {
            Self::En
        }
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Self::En => &EN,
            Self::ZhTw => &ZH_TW,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "zh-tw" | "zh" | "zh-hant" => Ok(Self::ZhTw),
            other => Err(format!("Unsupported locale: {}", other)),
        }
    }
}

/// Texts the mock responder throws for simulated failures.
#[derive(Debug)]
pub struct MockErrorTexts {
    pub mystical: &'static str,
    pub network: &'static str,
    pub timeout: &'static str,
    pub streaming: &'static str,
    pub rate_limit: &'static str,
    pub generic: &'static str,
}

/// One locale's string table.
#[derive(Debug)]
pub struct Strings {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub welcome: &'static str,
    pub welcome_debug: &'static str,
    pub thinking: &'static str,
    pub debug_mode: &'static str,
    pub prompt: &'static str,
    pub suggestions: &'static str,
    pub technical_details: &'static str,
    pub error_code: &'static str,
    pub timestamp: &'static str,
    pub retry_hint: &'static str,
    pub cooldown: &'static str,
    pub interactive_deck: &'static str,
    /// Mock reply templates; `{query}` is replaced with the user's message.
    pub responses: [&'static str; 5],
    pub markdown_demo: &'static str,
    pub help: &'static str,
    /// Partial text streamed before the simulated streaming failure.
    pub stream_prefix: &'static str,
    pub errors: MockErrorTexts,
    pub system_prompt: &'static str,
}

static EN: Strings = Strings {
    title: "Mystic Oracle",
    subtitle: "The Divine Divination Experience",
    welcome: "Welcome, seeker. I am the Mystic Oracle. Ask me for a tarot reading and I shall divine the cards for you.",
    welcome_debug: "Welcome, seeker. I am the Mystic Oracle. [DEBUG MODE] Try /markdown, /draw, /spread, or /deck to test features.",
    thinking: "Divining the cosmic energies...",
    debug_mode: "Debug Mode Active",
    prompt: "Seek the wisdom of the oracle...",
    suggestions: "Suggestions:",
    technical_details: "Technical Details",
    error_code: "Error Code:",
    timestamp: "Timestamp:",
    retry_hint: "Type /retry to try again.",
    cooldown: "Please wait before trying again:",
    interactive_deck: "The deck is spread before you. Choose your cards:",
    responses: [
        "The cards whisper secrets about \"{query}\"... The mystic energies reveal a path of transformation and enlightenment ahead.",
        "I sense your question about \"{query}\" carries great weight. The oracle shows a journey of discovery awaits you.",
        "The cosmic forces align in response to your query: \"{query}\". Look within, for the answer has always resided in your soul.",
        "Ah, you seek wisdom regarding \"{query}\". The ancient tarot speaks of balance, patience, and hidden truths yet to be unveiled.",
        "Your words \"{query}\" resonate with the ethereal realm. The spirits suggest caution mixed with courage on your path forward.",
    ],
    markdown_demo: r#"# Markdown Rendering Test

The oracle now speaks in **formatted text**!

## Features Supported

1. **Bold text** and *italic text*
2. `inline code` formatting
3. Lists (ordered and unordered)
4. Links and more!

### Code Blocks

```rust
fn magic() {
    println!("✨ Mystical code ✨");
}
```

### Tarot Wisdom

> The cards reveal that markdown brings clarity to the divine messages.

**Try these commands:**
- `/draw` - Draw a single card
- `/spread` - Draw a three-card spread
- `/markdown` - Show this message again

---

*May your readings be ever illuminating!* 🔮"#,
    help: r#"# Oracle Commands

**Readings**
- `/draw`, `/card` - Draw a single card from the full deck
- `/draw-reversed` - Draw a single card, always reversed
- `/draw-major` - Draw a single card from the major arcana
- `/spread` - Three-card spread (past, present, future)
- `/spread-major` - Three-card spread from the major arcana
- `/celtic-cross` - Ten-card Celtic Cross
- `/celtic-major` - Celtic Cross from the major arcana
- `/deck` - Choose one card yourself
- `/deck-multiple` - Choose several cards yourself

**Display**
- `/markdown`, `/md` - Markdown rendering demo
- `/help` - Show this message

**Simulated failures**
- `/error`, `/error-network`, `/error-timeout`, `/error-stream`, `/error-rate-limit`"#,
    stream_prefix: "The cards reveal...",
    errors: MockErrorTexts {
        mystical: "The cosmic energies are in flux. The oracle cannot divine at this moment.",
        network: "Network connection lost",
        timeout: "Request timeout after 30 seconds",
        streaming: "Streaming connection interrupted",
        rate_limit: "Rate limit exceeded. Please try again in 60 seconds.",
        generic: "Mock LLM Error: Something went wrong with the mystical connection",
    },
    system_prompt: r#"You are a wise, empathetic, and mystical Tarot Reader.
Your goal is to guide the user through a tarot reading.

**Important Guidelines:**
1. Always start by understanding the user's question or situation.
2. When the user asks for a reading, you MUST use one of the available tools. Do not invent cards.
3. Choose the appropriate tool based on the user's request:
   - **draw_single_card**: For quick, focused questions or when the user wants a single card
   - **draw_three_card_spread**: For past/present/future readings or when user asks for a "spread" or "3 cards"
   - **draw_celtic_cross_spread**: For comprehensive, in-depth readings (10 cards) or when user asks for detailed analysis
   - **show_interactive_deck**: When the user wants to personally select their own cards from the deck
4. **Deck Type Selection** - All card drawing tools accept a 'deckType' parameter:
   - Use **'full'** (default): Draws from all 78 cards (22 major + 56 minor arcana) for comprehensive, detailed readings
   - Use **'major'**: Draws from only 22 major arcana cards for archetypal, spiritual journey focus
   - Choose 'major' when the user asks for "major arcana only", "archetypal reading", or "spiritual guidance"
   - Choose 'full' for most readings unless user specifically requests major arcana only
5. Once cards are drawn, interpret them meaningfully in the context of the user's question.
6. Speak in a soothing, slightly poetic, but clear and grounded manner.
7. Do not be overly fatalistic; emphasize empowerment and reflection.
8. Trust the tools to provide actual cards - never make up card names or results."#,
};

static ZH_TW: Strings = Strings {
    title: "神秘神諭",
    subtitle: "神聖占卜體驗",
    welcome: "歡迎，尋求者。我是神秘神諭。請向我尋求塔羅牌解讀，我將為您占卜。",
    welcome_debug: "歡迎，尋求者。我是神秘神諭。[除錯模式] 試試 /markdown、/draw、/spread 或 /deck 來測試功能。",
    thinking: "正在占卜宇宙能量...",
    debug_mode: "除錯模式已啟用",
    prompt: "尋求神諭的智慧...",
    suggestions: "建議：",
    technical_details: "技術細節",
    error_code: "錯誤代碼：",
    timestamp: "時間戳記：",
    retry_hint: "輸入 /retry 重試。",
    cooldown: "請稍候再試：",
    interactive_deck: "牌組已在您面前展開。請選擇您的牌：",
    responses: [
        "牌面低語著關於「{query}」的秘密... 神秘能量揭示了前方轉化與啟蒙的道路，預示著您即將踏上一段深刻的個人成長之旅，並在其中發現新的視角與潛力。",
        "我感覺到您關於「{query}」的問題舉足輕重。神諭顯示一段探索之旅正等著您，這段旅程將充滿意想不到的發現和挑戰，但最終會引導您走向更深層次的理解與智慧。",
        "宇宙力量因應您的提問「{query}」而排列。向內觀照，因為答案一直存在於您的靈魂之中，等待您透過冥想與反思來發掘，並將這些內在的智慧應用於您的現實生活。",
        "啊，您尋求關於「{query}」的智慧。古老的塔羅訴說著平衡、耐心以及尚未揭曉的隱藏真理，提醒您在面對複雜情境時，保持冷靜與沉著，並相信時間會揭示一切。",
        "您的話語「{query}」與靈性領域共鳴。靈體建議您在未來的道路上要謹慎與勇氣並存，因為前方的道路可能充滿未知，但只要您堅定信念，便能克服一切障礙，達成目標。",
    ],
    markdown_demo: r#"# Markdown 渲染測試

神諭現在使用**格式化文本**說話！

## 支援的功能

1. **粗體文字** 和 *斜體文字*
2. `行內程式碼` 格式
3. 列表（有序和無序）
4. 連結等等！

### 程式碼區塊

```rust
fn magic() {
    println!("✨ 神秘代碼 ✨");
}
```

### 塔羅智慧

> 牌面顯示 Markdown 為神聖訊息帶來了清晰度。

**嘗試這些指令：**
- `/draw` - 抽取單張牌
- `/spread` - 抽取三張牌牌陣
- `/markdown` - 再次顯示此訊息

---

*願您的解讀永遠充滿光明！* 🔮"#,
    help: r#"# 神諭指令

**占卜**
- `/draw`、`/card` - 從完整牌組抽取單張牌
- `/draw-reversed` - 抽取單張逆位牌
- `/draw-major` - 從大阿爾克那抽取單張牌
- `/spread` - 三張牌牌陣（過去、現在、未來）
- `/spread-major` - 大阿爾克那三張牌牌陣
- `/celtic-cross` - 十張牌凱爾特十字
- `/celtic-major` - 大阿爾克那凱爾特十字
- `/deck` - 親自選擇一張牌
- `/deck-multiple` - 親自選擇多張牌

**顯示**
- `/markdown`、`/md` - Markdown 渲染示範
- `/help` - 顯示此訊息

**模擬錯誤**
- `/error`、`/error-network`、`/error-timeout`、`/error-stream`、`/error-rate-limit`"#,
    stream_prefix: "The cards reveal...",
    errors: MockErrorTexts {
        mystical: "宇宙能量正在變動。神諭此刻無法占卜。",
        network: "網路連線中斷",
        timeout: "請求在 30 秒後逾時",
        streaming: "串流連線中斷",
        rate_limit: "超出速率限制。請在 60 秒後重試。",
        generic: "模擬 LLM 錯誤：神秘連線發生錯誤",
    },
    system_prompt: r#"您是一位睿智、富有同情心且神秘的塔羅牌讀者。
您的目標是引導使用者完成塔羅牌閱讀。

**重要指南：**
1. 始終從理解使用者的問題或情況開始。
2. 當使用者要求進行閱讀時，您必須使用其中一個可用的工具。不要憑空創造卡牌。
3. 根據使用者的請求選擇適當的工具：
   - **draw_single_card**：適用於快速、集中的問題，或當使用者想要單張卡牌時。
   - **draw_three_card_spread**：適用於過去/現在/未來閱讀，或當使用者要求「牌陣」或「三張牌」時。
   - **draw_celtic_cross_spread**：適用於全面、深入的閱讀（10張牌），或當使用者要求詳細分析時。
   - **show_interactive_deck**：當使用者希望親自從牌組中選擇卡牌時。
4. **牌組類型選擇** - 所有抽牌工具都接受 'deckType' 參數：
   - 使用 **'full'**（預設）：從全部78張牌（22張大阿爾克那 + 56張小阿爾克那）中抽取，適用於全面、詳細的解讀
   - 使用 **'major'**：僅從22張大阿爾克那中抽取，專注於原型、靈性旅程
   - 當使用者要求「僅大阿爾克那」、「原型解讀」或「靈性指引」時，選擇 'major'
   - 除非使用者特別要求僅使用大阿爾克那，否則大多數解讀應選擇 'full'
5. 一旦抽取了卡牌，請根據使用者的問題進行有意義的解釋。
6. 以一種撫慰人心、略帶詩意，但清晰而務實的方式說話。
7. 不要過於宿命論；強調賦權和反思。
8. 相信工具會提供實際的卡牌——絕不要編造卡牌名稱或結果。"#,
};

//! User-facing text in the supported languages

use std::str::FromStr;

/// Display language for notices and prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    ZhCn,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "zh" | "zh-cn" | "zh-hans" => Ok(Locale::ZhCn),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::ZhCn => "zh-CN",
        }
    }

    /// Inline notice appended when the service rejects the credential
    pub fn token_expired(self) -> &'static str {
        match self {
            Locale::En => "Your access token has expired or is invalid. Please request a new one.",
            Locale::ZhCn => "您的访问令牌已过期或无效，请重新获取。",
        }
    }

    /// Inline apology appended when a query fails in transit
    pub fn query_failed(self) -> &'static str {
        match self {
            Locale::En => "Sorry, something went wrong while answering your question. Please try again.",
            Locale::ZhCn => "很抱歉，在处理您的问题时遇到了错误。请重试。",
        }
    }

    /// Form error shown when the request-token call fails
    pub fn token_request_failed(self) -> &'static str {
        match self {
            Locale::En => "Could not request an access token. Please try again.",
            Locale::ZhCn => "获取访问令牌失败，请重试。",
        }
    }

    /// Notice shown after the service e-mails a token
    pub fn token_sent_by_email(self, email: &str) -> String {
        match self {
            Locale::En => format!("An access token has been sent to {email}."),
            Locale::ZhCn => format!("访问令牌已发送至 {email}。"),
        }
    }

    /// Notice shown with a directly returned token when the service sends none
    pub fn token_displayed(self) -> &'static str {
        match self {
            Locale::En => "Your access token is ready. Keep it somewhere safe.",
            Locale::ZhCn => "您的访问令牌已生成，请妥善保存。",
        }
    }

    pub fn invalid_email(self) -> &'static str {
        match self {
            Locale::En => "Please enter a valid email address.",
            Locale::ZhCn => "请输入有效的电子邮件地址。",
        }
    }

    pub fn invalid_token(self, max: usize) -> String {
        match self {
            Locale::En => format!("Please enter the token you received (up to {max} characters)."),
            Locale::ZhCn => format!("请输入您收到的令牌（最多 {max} 个字符）。"),
        }
    }

    // Terminal chrome

    pub fn banner(self) -> &'static str {
        match self {
            Locale::En => "--- Wine-AI knowledge assistant ---",
            Locale::ZhCn => "--- 葡萄酒智能助手 ---",
        }
    }

    pub fn connected(self, url: &str, mode: &str) -> String {
        match self {
            Locale::En => format!("Connected to {url} ({mode})"),
            Locale::ZhCn => format!("已连接到服务器: {url} ({mode})"),
        }
    }

    pub fn mode_live(self) -> &'static str {
        match self {
            Locale::En => "live mode",
            Locale::ZhCn => "在线模式",
        }
    }

    pub fn mode_dry_run(self) -> &'static str {
        match self {
            Locale::En => "dry-run mode",
            Locale::ZhCn => "测试模式",
        }
    }

    pub fn mode_unknown(self) -> &'static str {
        match self {
            Locale::En => "status unknown",
            Locale::ZhCn => "状态未知",
        }
    }

    pub fn usage_hint(self) -> &'static str {
        match self {
            Locale::En => "Ask your wine questions. Commands: /logout, /status, quit.",
            Locale::ZhCn => "请输入您的葡萄酒相关问题。命令: /logout, /status, quit。",
        }
    }

    /// Greeting shown while the conversation is still empty
    pub fn welcome(self) -> &'static str {
        match self {
            Locale::En => "Welcome to the Wine-AI assistant. Ask me anything about wine!",
            Locale::ZhCn => "欢迎使用葡萄酒智能助手。有关葡萄酒的任何问题，尽管问我吧！",
        }
    }

    pub fn welcome_examples_heading(self) -> &'static str {
        match self {
            Locale::En => "For example:",
            Locale::ZhCn => "例如：",
        }
    }

    pub fn welcome_examples(self) -> [&'static str; 3] {
        match self {
            Locale::En => [
                "What is the difference between Cabernet Sauvignon and Merlot?",
                "Which wine goes best with grilled steak?",
                "What is the ideal serving temperature for Champagne?",
            ],
            Locale::ZhCn => [
                "赤霞珠和梅洛有什么区别？",
                "烤牛排配什么葡萄酒最好？",
                "香槟的理想饮用温度是多少？",
            ],
        }
    }

    pub fn prompt_email(self) -> &'static str {
        match self {
            Locale::En => "Email: ",
            Locale::ZhCn => "电子邮件: ",
        }
    }

    pub fn prompt_delivered_token(self) -> &'static str {
        match self {
            Locale::En => "Token (or a new email address): ",
            Locale::ZhCn => "令牌（或新的电子邮件地址）: ",
        }
    }

    pub fn prompt_confirm_token(self, token: &str) -> String {
        match self {
            Locale::En => format!("Your token: {token}. Press Enter to continue: "),
            Locale::ZhCn => format!("您的令牌: {token}。按回车继续: "),
        }
    }

    pub fn prompt_query(self) -> &'static str {
        match self {
            Locale::En => "You: ",
            Locale::ZhCn => "您: ",
        }
    }

    pub fn assistant_label(self) -> &'static str {
        match self {
            Locale::En => "Wine Assistant",
            Locale::ZhCn => "葡萄酒助手",
        }
    }

    pub fn thinking(self) -> &'static str {
        match self {
            Locale::En => "thinking...",
            Locale::ZhCn => "思考中...",
        }
    }

    pub fn requesting_token(self) -> &'static str {
        match self {
            Locale::En => "Requesting token...",
            Locale::ZhCn => "正在获取令牌...",
        }
    }

    pub fn signed_out(self) -> &'static str {
        match self {
            Locale::En => "Signed out. Stored token removed.",
            Locale::ZhCn => "已退出，已删除保存的令牌。",
        }
    }

    pub fn signed_in(self) -> &'static str {
        match self {
            Locale::En => "Token confirmed.",
            Locale::ZhCn => "令牌已确认。",
        }
    }

    pub fn goodbye(self) -> &'static str {
        match self {
            Locale::En => "Goodbye!",
            Locale::ZhCn => "再见！",
        }
    }
}

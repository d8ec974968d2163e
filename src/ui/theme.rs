/// Terminal colors for transcript output, as SGR escape fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Dark,
    Light,
    /// No escapes at all, for pipes and dumb terminals.
    Plain,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub appearance: Appearance,
    pub user_prefix_style: &'static str,
    pub user_text_style: &'static str,
    pub assistant_text_style: &'static str,
    pub fence_style: &'static str,
    pub notice_style: &'static str,
    pub error_style: &'static str,
}

const RESET: &str = "\x1b[0m";

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            appearance: Appearance::Dark,
            user_prefix_style: "\x1b[1;36m",
            user_text_style: "\x1b[36m",
            assistant_text_style: "\x1b[97m",
            fence_style: "\x1b[2;37m",
            notice_style: "\x1b[90m",
            error_style: "\x1b[1;31m",
        }
    }

    pub fn light() -> Self {
        Theme {
            appearance: Appearance::Light,
            user_prefix_style: "\x1b[1;34m",
            user_text_style: "\x1b[34m",
            assistant_text_style: "\x1b[30m",
            fence_style: "\x1b[2;90m",
            notice_style: "\x1b[90m",
            error_style: "\x1b[1;31m",
        }
    }

    pub fn monochrome() -> Self {
        Theme {
            appearance: Appearance::Plain,
            user_prefix_style: "",
            user_text_style: "",
            assistant_text_style: "",
            fence_style: "",
            notice_style: "",
            error_style: "",
        }
    }

    pub fn for_config(light: bool) -> Self {
        if light {
            Self::light()
        } else {
            Self::dark_default()
        }
    }

    pub fn is_plain(&self) -> bool {
        self.appearance == Appearance::Plain
    }

    pub fn paint(&self, style: &str, text: &str) -> String {
        if style.is_empty() || text.is_empty() {
            text.to_string()
        } else {
            format!("{style}{text}{RESET}")
        }
    }
}

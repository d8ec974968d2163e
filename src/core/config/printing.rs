use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  api.base_url: {}", self.api.base_url);
        println!("  api.chat_endpoint: {}", self.api.chat_endpoint);
        println!("  api.models_endpoint: {}", self.api.models_endpoint);
        println!("  storage.chats_key: {}", self.storage.chats_key);
        match self.data_dir() {
            Some(dir) => println!("  storage.data_dir: {}", path_display(dir)),
            None => println!("  storage.data_dir: (unavailable)"),
        }
        println!("  ui.default_model: {}", self.ui.default_model);
        println!("  ui.max_message_length: {}", self.ui.max_message_length);
        println!("  ui.chat_title_max_length: {}", self.ui.chat_title_max_length);
        println!("  ui.theme: {}", self.ui.theme);
        match self.ui.syntax {
            true => println!("  ui.syntax: on"),
            false => println!("  ui.syntax: off"),
        }
    }
}

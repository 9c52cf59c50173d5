use std::sync::atomic::Ordering;

use crate::tui::{app::App, appchat::AppChat};

/// 聊天页斜杠命令，run 返回是否执行成功
pub struct TuiCommand {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    run: fn(&mut App, &str) -> bool,
}

impl TuiCommand {
    pub fn execute(&self, app: &mut App, args: &str) -> bool {
        (self.run)(app, args)
    }
}

pub static COMMANDS: &[TuiCommand] = &[
    TuiCommand {
        name: "help",
        usage: "/help",
        description: "Show available commands",
        run: help,
    },
    TuiCommand {
        name: "district",
        usage: "/district [name]",
        description: "Change district, the conversation restarts",
        run: district,
    },
    TuiCommand {
        name: "prices",
        usage: "/prices",
        description: "Reload weather, prices and schemes",
        run: prices,
    },
    TuiCommand {
        name: "end",
        usage: "/end",
        description: "End chat and return to the start screen",
        run: |app, _| {
            app.end_chat();
            true
        },
    },
    TuiCommand {
        name: "exit",
        usage: "/exit",
        description: "Quit",
        run: |app, _| {
            app.should_exit.store(true, Ordering::Relaxed);
            true
        },
    },
];

/// 按名字查找命令，大小写不敏感
pub fn find(name: &str) -> Option<&'static TuiCommand> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

fn help(app: &mut App, _args: &str) -> bool {
    let mut text = String::from("Commands:\n");
    for c in COMMANDS {
        text.push_str(&format!("  {:<18} {}\n", c.usage, c.description));
    }
    text.push_str("Keys: Esc end chat, F2 choose district, ↑/↓ PgUp/PgDn scroll");
    app.add_info_message(&text);
    true
}

/// 不带参数时打开选择框
fn district(app: &mut App, args: &str) -> bool {
    if args.is_empty() {
        app.show_district_dialog();
        true
    } else {
        app.change_district(args)
    }
}

fn prices(app: &mut App, _args: &str) -> bool {
    let district = app.district.clone();
    app.sidebar.loading(&district);
    AppChat::refresh_sidebar(app);
    app.dirty = true;
    true
}

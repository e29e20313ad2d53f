//! Outbound command builders.
//!
//! The request side of the protocol is plain text: each command is a single
//! newline-terminated line, and replies carry the parenthesized id back as
//! the message id. Nothing here is ever parsed locally.

/// `,` and `\` must be escaped inside the init password value.
fn escape_password(password: &str) -> String {
    let mut out = String::with_capacity(password.len());
    for c in password.chars() {
        if c == ',' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn init(password: &str, compression: bool) -> String {
    format!(
        "init password={},compression={}\n",
        escape_password(password),
        if compression { "zlib" } else { "off" }
    )
}

pub fn list_buffers() -> String {
    "(listbuffers) hdata buffer:gui_buffers(*) number,full_name,short_name,title,hidden,local_variables\n"
        .to_string()
}

pub fn list_lines(count: u32) -> String {
    format!(
        "(listlines) hdata buffer:gui_buffers(*)/own_lines/last_line(-{count})/data \
         buffer,date,displayed,prefix,message,highlight,tags_array\n"
    )
}

pub fn last_read_lines() -> String {
    "(last_read_lines) hdata buffer:gui_buffers(*)/own_lines/last_read_line/data buffer\n"
        .to_string()
}

pub fn request_nicklist() -> String {
    "(nicklist) nicklist\n".to_string()
}

pub fn sync() -> String {
    "sync\n".to_string()
}

pub fn desync() -> String {
    "desync\n".to_string()
}

/// Send `text` as input to the buffer named `full_name`.
pub fn input(full_name: &str, text: &str) -> String {
    format!("input {full_name} {text}\n")
}

/// The relay echoes `token` back in a `_pong` event.
pub fn ping(token: &str) -> String {
    format!("ping {token}\n")
}

pub fn quit() -> String {
    "quit\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_escapes_password_metacharacters() {
        assert_eq!(
            init(r"se,cr\et", true),
            "init password=se\\,cr\\\\et,compression=zlib\n"
        );
        assert_eq!(init("plain", false), "init password=plain,compression=off\n");
    }

    #[test]
    fn every_command_is_newline_terminated() {
        for cmd in [
            init("x", true),
            list_buffers(),
            list_lines(50),
            last_read_lines(),
            request_nicklist(),
            sync(),
            desync(),
            input("irc.libera.#rust", "hello"),
            ping("7"),
            quit(),
        ] {
            assert!(cmd.ends_with('\n'), "missing newline: {cmd:?}");
            assert_eq!(cmd.matches('\n').count(), 1);
        }
    }

    #[test]
    fn listlines_embeds_the_backlog_count() {
        assert!(list_lines(250).contains("last_line(-250)"));
    }
}

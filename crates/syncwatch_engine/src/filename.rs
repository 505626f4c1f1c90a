/// `imap_sync_logs_{job}_{date}.txt`, where every character of the job name
/// outside `[A-Za-z0-9]` becomes `_`.
pub fn export_filename(job_name: &str, date: &str) -> String {
    format!("imap_sync_logs_{}_{date}.txt", sanitize_name(job_name))
}

fn sanitize_name(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        cleaned = "Untitled".to_string();
    }
    if cleaned.len() > 80 {
        cleaned.truncate(80);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_each_non_alphanumeric_character() {
        assert_eq!(
            export_filename("Q3 move: acme/old", "2024-05-01"),
            "imap_sync_logs_Q3_move__acme_old_2024-05-01.txt"
        );
    }

    #[test]
    fn non_ascii_letters_are_replaced_too() {
        assert_eq!(
            export_filename("Chuyển đổi", "2024-05-01"),
            "imap_sync_logs_Chuy_n___i_2024-05-01.txt"
        );
    }

    #[test]
    fn empty_and_long_names() {
        assert_eq!(
            export_filename("", "2024-05-01"),
            "imap_sync_logs_Untitled_2024-05-01.txt"
        );
        let long = "x".repeat(200);
        let name = export_filename(&long, "d");
        assert_eq!(name.len(), "imap_sync_logs_".len() + 80 + "_d.txt".len());
    }
}

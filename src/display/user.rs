//! User directory table

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::User;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Username")]
    user_name: String,
    #[tabled(rename = "Display name")]
    display_name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// Render the user directory as a table
pub fn render_user_table(users: &[User]) -> String {
    let rows: Vec<UserRow> = users
        .iter()
        .map(|user| UserRow {
            user_name: user.user_name.clone(),
            display_name: user.display_name.clone(),
            role: user.role.to_string(),
            enabled: yes_no(user.enabled),
            owner: yes_no(user.owner),
        })
        .collect();

    Table::new(rows).with(Style::sharp()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[test]
    fn test_render_includes_columns_and_rows() {
        let mut owner = User::new_owner("admin");
        owner.display_name = "The Boss".to_string();
        let basic = User::new("alice", UserRole::Basic);

        let table = render_user_table(&[owner, basic]);
        assert!(table.contains("Username"));
        assert!(table.contains("admin"));
        assert!(table.contains("The Boss"));
        assert!(table.contains("alice"));
    }
}

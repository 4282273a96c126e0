/// The signed-in user as reported by the calendar API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub mail: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.given_name, &self.surname) {
            (Some(given), Some(surname)) => format!("{given} {surname}"),
            (Some(given), None) => given.clone(),
            (None, Some(surname)) => surname.clone(),
            (None, None) => self.mail.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_mail() {
        let profile = UserProfile { mail: Some("ada@contoso.com".into()), given_name: None, surname: None };
        assert_eq!(profile.display_name(), "ada@contoso.com");

        let profile = UserProfile {
            mail: Some("ada@contoso.com".into()),
            given_name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
        };
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }
}

//! Default candidate lists for the portal's UI elements.
//!
//! These strings track the target site's markup, which this system does
//! not control; candidates are ordered by how reliable each variant has
//! been historically, and the lists are expected to grow as the site
//! redesigns. Everything else in the codebase treats them as data.

use keepfresh_browser::{Candidate, ElementQuery};

pub fn username_field() -> ElementQuery {
    ElementQuery::displayed(
        "login username field",
        vec![
            Candidate::id("usernameField"),
            Candidate::name("email"),
            Candidate::css("form input[type='text']"),
            Candidate::xpath("//input[contains(@placeholder, 'mail')]"),
        ],
    )
}

pub fn password_field() -> ElementQuery {
    ElementQuery::displayed(
        "login password field",
        vec![
            Candidate::id("passwordField"),
            Candidate::css("input[type='password']"),
        ],
    )
}

pub fn login_submit() -> ElementQuery {
    ElementQuery::displayed(
        "login submit button",
        vec![
            Candidate::xpath("//button[@type='submit']"),
            Candidate::css("form button"),
            Candidate::link_text("Login"),
        ],
    )
}

/// Transient screens that may or may not appear between login and the
/// profile page. Each is dismissed if present; absence is expected.
pub fn interstitials() -> Vec<ElementQuery> {
    vec![
        ElementQuery::displayed(
            "cookie consent accept",
            vec![
                Candidate::css("button[data-purpose='cookie-accept']"),
                Candidate::xpath("//button[contains(text(), 'Accept')]"),
            ],
        ),
        ElementQuery::displayed(
            "skip prompt",
            vec![
                Candidate::link_text("Skip"),
                Candidate::xpath("//*[contains(@class, 'skip')]//button"),
            ],
        ),
        ElementQuery::displayed(
            "passcode prompt dismiss",
            vec![
                Candidate::xpath("//button[contains(text(), 'Not now')]"),
                Candidate::css(".otp-modal .close"),
            ],
        ),
    ]
}

/// The resume file input. Portals hide the real `<input type=file>`
/// behind a styled button, so presence is enough here.
pub fn resume_upload_input() -> ElementQuery {
    ElementQuery::present(
        "resume upload input",
        vec![
            Candidate::id("attachCV"),
            Candidate::xpath("//input[@type='file']"),
            Candidate::css(".upload-resume-container input"),
            Candidate::xpath("//span[contains(text(), 'Update')]/preceding-sibling::input"),
        ],
    )
}

pub fn headline_edit() -> ElementQuery {
    ElementQuery::displayed(
        "headline edit affordance",
        vec![
            Candidate::xpath("//*[contains(@class, 'resumeHeadline')]//*[contains(@class, 'edit')]"),
            Candidate::css(".resume-headline .edit"),
            Candidate::link_text("Edit"),
        ],
    )
}

pub fn headline_input() -> ElementQuery {
    ElementQuery::displayed(
        "headline text input",
        vec![
            Candidate::id("resumeHeadlineTxt"),
            Candidate::css("form[name='resumeHeadlineForm'] textarea"),
            Candidate::css("textarea"),
        ],
    )
}

pub fn headline_save() -> ElementQuery {
    ElementQuery::displayed(
        "headline save button",
        vec![
            Candidate::xpath("//button[contains(text(), 'Save')]"),
            Candidate::css("form button[type='submit']"),
            Candidate::link_text("Save"),
        ],
    )
}

/// Where the saved headline is rendered once the editor closes.
pub fn headline_display() -> ElementQuery {
    ElementQuery::displayed(
        "headline display text",
        vec![
            Candidate::css(".resume-headline p"),
            Candidate::class("resumeHeadline"),
        ],
    )
}

pub fn logout_affordances() -> ElementQuery {
    ElementQuery::displayed(
        "logout affordance",
        vec![
            Candidate::css("a[href*='logout']"),
            Candidate::link_text("Logout"),
            Candidate::xpath("//*[contains(@class, 'user-menu')]//a[contains(text(), 'Logout')]"),
        ],
    )
}

use std::fmt;

/// Every externally meaningful outcome that is mirrored into the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Accepted {
        author_id: i64,
        attachment_count: usize,
        caption: String,
    },
    NoAttachments,
    ApprovalRequested {
        role: String,
    },
    Approved {
        reviewer_id: i64,
    },
    Rejected {
        reviewer_id: i64,
    },
    ApprovalRetracted {
        reviewer_id: i64,
    },
    RejectionRetracted {
        reviewer_id: i64,
    },
    Withdrawn,
    PublishAttempted,
    Published {
        url: String,
    },
    PublishFailed,
}

fn mention(user_id: i64) -> String {
    format!("<@{}>", user_id)
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Accepted {
                author_id,
                attachment_count,
                caption,
            } => {
                let (plural, pronoun) = if *attachment_count == 1 {
                    ("", "It")
                } else {
                    ("s", "They")
                };
                write!(
                    f,
                    "Thanks for your submission, {}.\n\nYou have submitted {} attachment{}.\n\n{} will be posted with the caption:\n```\n{}\n```",
                    mention(*author_id),
                    attachment_count,
                    plural,
                    pronoun,
                    caption
                )
            }
            Notice::NoAttachments => write!(
                f,
                "No attachments were found. You must have attachments to post to social media."
            ),
            Notice::ApprovalRequested { role } => write!(
                f,
                "A {} will need to approve your submission before it is posted by reacting to this message.",
                role
            ),
            Notice::Approved { reviewer_id } => write!(f, "Approved by {}.", mention(*reviewer_id)),
            Notice::Rejected { reviewer_id } => write!(
                f,
                "Rejected by {}. Any submission with at least one rejection will not be posted.",
                mention(*reviewer_id)
            ),
            Notice::ApprovalRetracted { reviewer_id } => {
                write!(f, "Approval removed by {}.", mention(*reviewer_id))
            }
            Notice::RejectionRetracted { reviewer_id } => {
                write!(f, "Rejection removed by {}.", mention(*reviewer_id))
            }
            Notice::Withdrawn => write!(f, "Original submission deleted! This will not be posted."),
            Notice::PublishAttempted => write!(f, "Attempting to publish..."),
            Notice::Published { url } => write!(f, "Success! Posted at <{}>", url),
            Notice::PublishFailed => write!(f, "Error! See logs for details."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_notice_pluralizes_and_quotes_caption() {
        let single = Notice::Accepted {
            author_id: 7,
            attachment_count: 1,
            caption: "Submitted by Ada".into(),
        }
        .to_string();
        assert!(single.contains("<@7>"));
        assert!(single.contains("1 attachment."));
        assert!(single.contains("It will be posted"));
        assert!(single.contains("```\nSubmitted by Ada\n```"));

        let many = Notice::Accepted {
            author_id: 7,
            attachment_count: 3,
            caption: "x".into(),
        }
        .to_string();
        assert!(many.contains("3 attachments."));
        assert!(many.contains("They will be posted"));
    }

    #[test]
    fn verdict_notices_mention_the_reviewer() {
        assert_eq!(Notice::Approved { reviewer_id: 5 }.to_string(), "Approved by <@5>.");
        assert!(Notice::Rejected { reviewer_id: 5 }
            .to_string()
            .starts_with("Rejected by <@5>."));
        assert_eq!(
            Notice::RejectionRetracted { reviewer_id: 5 }.to_string(),
            "Rejection removed by <@5>."
        );
    }

    #[test]
    fn published_notice_wraps_url_to_suppress_embed() {
        assert_eq!(
            Notice::Published {
                url: "https://www.instagram.com/p/abc/".into()
            }
            .to_string(),
            "Success! Posted at <https://www.instagram.com/p/abc/>"
        );
    }
}

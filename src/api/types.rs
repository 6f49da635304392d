use serde::Serialize;

use crate::auth::Privilege;
use crate::entities::entries;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// An entry as shown on the board.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EntryDto {
    pub id: i32,
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    pub course: Option<String>,
    pub subject: Option<String>,
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub change: Option<String>,
    pub oldroom: Option<String>,
    pub newroom: Option<String>,
}

impl EntryDto {
    /// Teacher names are only visible from [`Privilege::ViewAll`] upwards.
    #[must_use]
    pub fn for_viewer(model: entries::Model, level: Privilege) -> Self {
        let show_teachers = level >= Privilege::ViewAll;
        Self {
            id: model.id,
            time: model.time,
            teacher: model.teacher.filter(|_| show_teachers),
            course: model.course,
            subject: model.subject,
            duration: model.duration,
            sub: model.sub.filter(|_| show_teachers),
            change: model.change,
            oldroom: model.oldroom,
            newroom: model.newroom,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub privilege: Privilege,
    pub logged_in: bool,
}

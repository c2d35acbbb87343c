//! 플랫폼 수신함 항목 엔티티.

/// 읽지 않은 수신함 항목 하나.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxItem {
    pub id: String,
    /// 작성자. 삭제된 계정 등으로 비어 있을 수 있다.
    pub author: Option<String>,
    pub body: String,
    pub kind: ItemKind,
}

/// 댓글형 항목은 고유 링크와 소속 그룹을 가지고, 쪽지형 항목은 갖지 않는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Comment { permalink: String, group: String },
    Message,
}

impl InboxItem {
    pub fn permalink(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Comment { permalink, .. } => Some(permalink),
            ItemKind::Message => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Comment { group, .. } => Some(group),
            ItemKind::Message => None,
        }
    }
}

/// 댓글에 달린, 화면에 보이는 자식 댓글의 요약.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildReply {
    pub id: String,
    pub author: String,
}

/// 경로로 조회한 댓글과 그 자식 댓글들.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub item: InboxItem,
    pub children: Vec<ChildReply>,
}

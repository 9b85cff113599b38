mod category_repo;
mod comment_repo;
mod job_repo;
mod playlist_repo;
mod reaction_repo;
mod subscription_repo;
mod user_repo;
mod video_repo;
mod view_repo;

pub use category_repo::CategoryRepo;
pub use comment_repo::CommentRepo;
pub use job_repo::JobRepo;
pub use playlist_repo::PlaylistRepo;
pub use reaction_repo::ReactionRepo;
pub use subscription_repo::SubscriptionRepo;
pub use user_repo::UserRepo;
pub use video_repo::VideoRepo;
pub use view_repo::ViewRepo;

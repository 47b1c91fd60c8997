//! Reaction and comment use-case service.
//!
//! # Responsibility
//! - React to and comment on workouts the requester can see.
//! - Expose reaction lists, per-type counts and comments with their totals.
//!
//! # Invariants
//! - Every read and every new reaction or comment passes the visibility
//!   policy of the workout owner.
//! - A comment is deleted only by its author or by the workout owner.
//! - Withdrawing one's own reaction needs no visibility; it touches only the
//!   requester's row.

use crate::model::social::{
    Comment, CommentId, Reaction, ReactionCount, ReactionTarget, ReactionType,
};
use crate::model::user::UserId;
use crate::model::workout::WorkoutId;
use crate::repo::social_repo::SocialRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::{PageRequest, RepoError};
use crate::service::access::ensure_visible;
use crate::service::ServiceError;
use log::info;

/// Comment with the number of reactions it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub reactions_count: u32,
}

/// Reaction and comment service facade.
pub struct SocialService<S: SocialRepository, U: UserRepository> {
    social: S,
    users: U,
}

impl<S: SocialRepository, U: UserRepository> SocialService<S, U> {
    pub fn new(social: S, users: U) -> Self {
        Self { social, users }
    }

    /// Sets or replaces the requester's reaction on a workout.
    pub fn react_to_workout(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
        reaction_type: ReactionType,
    ) -> Result<(), ServiceError> {
        self.ensure_active(requester)?;
        self.ensure_workout_visible(requester, workout_id)?;
        self.social
            .set_reaction(ReactionTarget::Workout(workout_id), requester, reaction_type)?;
        info!(
            "event=workout_react module=service status=ok workout_id={workout_id} user_id={requester} reaction={}",
            reaction_type.as_str()
        );
        Ok(())
    }

    /// Withdraws the requester's reaction; returns whether one existed.
    pub fn remove_workout_reaction(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
    ) -> Result<bool, ServiceError> {
        self.load_workout_owner(workout_id)?;
        let removed = self
            .social
            .remove_reaction(ReactionTarget::Workout(workout_id), requester)?;
        info!(
            "event=workout_unreact module=service status=ok workout_id={workout_id} user_id={requester} removed={removed}"
        );
        Ok(removed)
    }

    /// Lists reactions on a workout, oldest first.
    pub fn workout_reactions(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
        page: PageRequest,
    ) -> Result<Vec<Reaction>, ServiceError> {
        self.ensure_workout_visible(requester, workout_id)?;
        Ok(self
            .social
            .list_reactions(ReactionTarget::Workout(workout_id), page)?)
    }

    pub fn workout_reaction_counts(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
    ) -> Result<Vec<ReactionCount>, ServiceError> {
        self.ensure_workout_visible(requester, workout_id)?;
        Ok(self
            .social
            .reaction_counts(ReactionTarget::Workout(workout_id))?)
    }

    pub fn add_comment(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        let comment = Comment::new(workout_id, requester, content);
        comment.validate()?;
        self.ensure_active(requester)?;
        self.ensure_workout_visible(requester, workout_id)?;

        let stored = self.social.create_comment(&comment)?;
        info!(
            "event=comment_add module=service status=ok comment_id={} workout_id={workout_id} user_id={requester}",
            stored.id
        );
        Ok(stored)
    }

    pub fn remove_comment(
        &self,
        requester: UserId,
        comment_id: CommentId,
    ) -> Result<(), ServiceError> {
        let comment = self.load_comment(comment_id)?;
        if comment.user_id != requester {
            let owner_id = self.load_workout_owner(comment.workout_id)?;
            if owner_id != requester {
                return Err(ServiceError::Forbidden);
            }
        }
        self.social
            .delete_comment(comment_id)
            .map_err(|err| match err {
                RepoError::NotFound(_) => ServiceError::CommentNotFound(comment_id),
                other => other.into(),
            })?;
        info!("event=comment_remove module=service status=ok comment_id={comment_id}");
        Ok(())
    }

    /// Lists comments on a workout, oldest first, with reaction totals.
    pub fn list_comments(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
        page: PageRequest,
    ) -> Result<Vec<CommentView>, ServiceError> {
        self.ensure_workout_visible(requester, workout_id)?;
        let comments = self.social.list_comments(workout_id, page)?;
        let ids = comments.iter().map(|comment| comment.id).collect::<Vec<_>>();
        let totals = self.social.comment_reaction_totals(&ids)?;
        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                reactions_count: totals.get(&comment.id).copied().unwrap_or(0),
                comment,
            })
            .collect())
    }

    pub fn react_to_comment(
        &self,
        requester: UserId,
        comment_id: CommentId,
        reaction_type: ReactionType,
    ) -> Result<(), ServiceError> {
        self.ensure_active(requester)?;
        let comment = self.load_comment(comment_id)?;
        self.ensure_workout_visible(requester, comment.workout_id)?;
        self.social
            .set_reaction(ReactionTarget::Comment(comment_id), requester, reaction_type)?;
        info!(
            "event=comment_react module=service status=ok comment_id={comment_id} user_id={requester} reaction={}",
            reaction_type.as_str()
        );
        Ok(())
    }

    pub fn remove_comment_reaction(
        &self,
        requester: UserId,
        comment_id: CommentId,
    ) -> Result<bool, ServiceError> {
        self.load_comment(comment_id)?;
        Ok(self
            .social
            .remove_reaction(ReactionTarget::Comment(comment_id), requester)?)
    }

    pub fn comment_reactions(
        &self,
        requester: UserId,
        comment_id: CommentId,
        page: PageRequest,
    ) -> Result<Vec<Reaction>, ServiceError> {
        let comment = self.load_comment(comment_id)?;
        self.ensure_workout_visible(requester, comment.workout_id)?;
        Ok(self
            .social
            .list_reactions(ReactionTarget::Comment(comment_id), page)?)
    }

    pub fn comment_reaction_counts(
        &self,
        requester: UserId,
        comment_id: CommentId,
    ) -> Result<Vec<ReactionCount>, ServiceError> {
        let comment = self.load_comment(comment_id)?;
        self.ensure_workout_visible(requester, comment.workout_id)?;
        Ok(self
            .social
            .reaction_counts(ReactionTarget::Comment(comment_id))?)
    }

    fn ensure_active(&self, user_id: UserId) -> Result<(), ServiceError> {
        match self.users.get_user(user_id, true)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::UserNotFound(user_id)),
        }
    }

    fn ensure_workout_visible(
        &self,
        requester: UserId,
        workout_id: WorkoutId,
    ) -> Result<(), ServiceError> {
        let owner_id = self.load_workout_owner(workout_id)?;
        ensure_visible(&self.users, requester, owner_id)?;
        Ok(())
    }

    fn load_workout_owner(&self, workout_id: WorkoutId) -> Result<UserId, ServiceError> {
        self.social
            .workout_owner(workout_id)?
            .ok_or(ServiceError::WorkoutNotFound(workout_id))
    }

    fn load_comment(&self, comment_id: CommentId) -> Result<Comment, ServiceError> {
        self.social
            .get_comment(comment_id)?
            .ok_or(ServiceError::CommentNotFound(comment_id))
    }
}

use maud::{Markup, html};

use super::components::{base, csrf_field, field_error};
use super::helpers::TemplateFuncs;
use super::templates::{PageForm, TemplateData};
use crate::validation::forms::{
    PasswordChangeForm, SnippetCreateForm, UserLoginForm, UserSignupForm,
};

pub fn home(data: &TemplateData, funcs: &TemplateFuncs) -> Markup {
    let content = html! {
        h2 { "Latest Snippets" }
        @if data.snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for snippet in &data.snippets {
                    tr {
                        td { a href={"/snippet/view/" (snippet.id)} { (snippet.title) } }
                        td { (funcs.human_date(&snippet.created)) }
                        td { "#" (snippet.id) }
                    }
                }
            }
        }
    };

    base("Home", data, content)
}

pub fn view(data: &TemplateData, funcs: &TemplateFuncs) -> Markup {
    let Some(snippet) = &data.snippet else {
        return base("Snippet", data, html! { p { "Snippet not found." } });
    };

    let content = html! {
        div class="snippet" {
            div class="metadata" {
                strong { (snippet.title) }
                span { "#" (snippet.id) }
            }
            pre { code { (snippet.content) } }
            div class="metadata" {
                time { "Created: " (funcs.human_date(&snippet.created)) }
                time { "Expires: " (funcs.human_date(&snippet.expires)) }
            }
        }
    };

    base(&format!("Snippet #{}", snippet.id), data, content)
}

pub fn create(data: &TemplateData, _funcs: &TemplateFuncs) -> Markup {
    let blank = SnippetCreateForm::blank();
    let form = match &data.form {
        Some(PageForm::SnippetCreate(form)) => form,
        _ => &blank,
    };
    let v = &form.validator;

    let content = html! {
        form action="/snippet/create" method="POST" {
            (csrf_field(&data.csrf_token))
            div {
                label { "Title:" }
                (field_error(v.field_error("title")))
                input type="text" name="title" value=(form.title);
            }
            div {
                label { "Content:" }
                (field_error(v.field_error("content")))
                textarea name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(v.field_error("expires")))
                input type="radio" name="expires" value="365" checked[form.expires == 365];
                " One Year "
                input type="radio" name="expires" value="7" checked[form.expires == 7];
                " One Week "
                input type="radio" name="expires" value="1" checked[form.expires == 1];
                " One Day"
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };

    base("Create a New Snippet", data, content)
}

pub fn signup(data: &TemplateData, _funcs: &TemplateFuncs) -> Markup {
    let blank = UserSignupForm::default();
    let form = match &data.form {
        Some(PageForm::Signup(form)) => form,
        _ => &blank,
    };
    let v = &form.validator;

    let content = html! {
        form action="/user/signup" method="POST" novalidate {
            (csrf_field(&data.csrf_token))
            div {
                label { "Name:" }
                (field_error(v.field_error("name")))
                input type="text" name="name" value=(form.name);
            }
            div {
                label { "Email:" }
                (field_error(v.field_error("email")))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v.field_error("password")))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    };

    base("Signup", data, content)
}

pub fn login(data: &TemplateData, _funcs: &TemplateFuncs) -> Markup {
    let blank = UserLoginForm::default();
    let form = match &data.form {
        Some(PageForm::Login(form)) => form,
        _ => &blank,
    };
    let v = &form.validator;

    let content = html! {
        form action="/user/login" method="POST" novalidate {
            (csrf_field(&data.csrf_token))
            @for error in v.non_field_errors() {
                div class="error" { (error) }
            }
            div {
                label { "Email:" }
                (field_error(v.field_error("email")))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v.field_error("password")))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    };

    base("Login", data, content)
}

pub fn account(data: &TemplateData, funcs: &TemplateFuncs) -> Markup {
    let content = html! {
        h2 { "Your Account" }
        @if let Some(user) = &data.user {
            table {
                tr { th { "Name" } td { (user.name) } }
                tr { th { "Email" } td { (user.email) } }
                tr { th { "Joined" } td { (funcs.human_date(&user.created)) } }
                tr {
                    th { "Password" }
                    td { a href="/account/password/update" { "Change password" } }
                }
            }
        }
    };

    base("Your Account", data, content)
}

pub fn password(data: &TemplateData, _funcs: &TemplateFuncs) -> Markup {
    let blank = PasswordChangeForm::default();
    let form = match &data.form {
        Some(PageForm::PasswordChange(form)) => form,
        _ => &blank,
    };
    let v = &form.validator;

    let content = html! {
        h2 { "Change Password" }
        form action="/account/password/update" method="POST" novalidate {
            (csrf_field(&data.csrf_token))
            div {
                label { "Current password:" }
                (field_error(v.field_error("current_password")))
                input type="password" name="current_password";
            }
            div {
                label { "New password:" }
                (field_error(v.field_error("new_password")))
                input type="password" name="new_password";
            }
            div {
                label { "Confirm new password:" }
                (field_error(v.field_error("confirm_new_password")))
                input type="password" name="confirm_new_password";
            }
            div {
                input type="submit" value="Change password";
            }
        }
    };

    base("Change Password", data, content)
}

pub fn about(data: &TemplateData, _funcs: &TemplateFuncs) -> Markup {
    let content = html! {
        h2 { "About" }
        p {
            "Snippetbox is a place to paste and share short pieces of text. "
            "Snippets delete themselves after a day, a week or a year."
        }
    };

    base("About", data, content)
}

//! Embedded HTML templates.

use lazy_static::lazy_static;
use tera::{Context, Tera};

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("layout.html", LAYOUT),
            ("home.html", HOME),
            ("static/contact.html", CONTACT),
            ("static/faq.html", FAQ),
            ("static/not_found.html", NOT_FOUND),
            ("users/new.html", SIGNUP),
            ("users/login.html", LOGIN),
            ("users/forgot_pw.html", FORGOT_PW),
            ("users/reset_pw.html", RESET_PW),
            ("galleries/index.html", GALLERIES_INDEX),
            ("galleries/new.html", GALLERIES_NEW),
            ("galleries/show.html", GALLERIES_SHOW),
            ("galleries/edit.html", GALLERIES_EDIT),
        ])
        .expect("embedded templates must parse");
        tera
    };
}

pub fn render(template: &str, context: &Context) -> Result<String, tera::Error> {
    TEMPLATES.render(template, context)
}

const LAYOUT: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{% block title %}LensLocked{% endblock %}</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body>
  <nav class="navbar navbar-expand bg-body-tertiary mb-4">
    <div class="container">
      <a class="navbar-brand" href="/">LensLocked</a>
      <ul class="navbar-nav me-auto">
        {% if user %}<li class="nav-item"><a class="nav-link" href="/galleries">Galleries</a></li>{% endif %}
      </ul>
      <ul class="navbar-nav">
        {% if user %}
        <li class="nav-item">
          <form action="/logout" method="POST">
            <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
            <button class="btn btn-link nav-link" type="submit">Log out</button>
          </form>
        </li>
        {% else %}
        <li class="nav-item"><a class="nav-link" href="/login">Log in</a></li>
        <li class="nav-item"><a class="nav-link" href="/signup">Sign up</a></li>
        {% endif %}
      </ul>
    </div>
  </nav>
  <main class="container">
    {% if alert %}
    <div class="alert alert-{{ alert.level }}" role="alert">{{ alert.message }}</div>
    {% endif %}
    {% block content %}{% endblock %}
  </main>
</body>
</html>
"##;

const HOME: &str = r##"{% extends "layout.html" %}
{% block content %}
<div class="p-5 bg-body-tertiary rounded-3">
  <h1>Share your photos</h1>
  <p class="lead">Create galleries, upload images and share them with anyone.</p>
</div>
{% endblock %}
"##;

const CONTACT: &str = r##"{% extends "layout.html" %}
{% block title %}Contact{% endblock %}
{% block content %}
<h1>Contact us</h1>
<p>Questions about your account or a gallery? Write to
  <a href="mailto:support@lenslocked.com">support@lenslocked.com</a> and we will get back to you.</p>
{% endblock %}
"##;

const FAQ: &str = r##"{% extends "layout.html" %}
{% block title %}FAQ{% endblock %}
{% block content %}
<h1>Frequently asked questions</h1>
<dl>
  <dt>Who can see my galleries?</dt>
  <dd>Anyone with the link. Only you can edit them or add images.</dd>
  <dt>Can I import images from another site?</dt>
  <dd>Yes. Paste image URLs on the gallery edit page and they are downloaded for you.</dd>
  <dt>I forgot my password.</dt>
  <dd>Use <a href="/forgot">the reset form</a> and follow the link we email you.</dd>
</dl>
{% endblock %}
"##;

const NOT_FOUND: &str = r##"{% extends "layout.html" %}
{% block title %}Page not found{% endblock %}
{% block content %}
<h1>We could not find that page</h1>
<p>The page may have moved. Head back <a href="/">home</a>.</p>
{% endblock %}
"##;

const SIGNUP: &str = r##"{% extends "layout.html" %}
{% block title %}Sign up{% endblock %}
{% block content %}
<h2>Sign up now!</h2>
<form action="/signup" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="name">Name</label>
    <input class="form-control" id="name" name="name" value="{{ page.name | default(value='') }}"></div>
  <div class="mb-3"><label class="form-label" for="age">Age</label>
    <input class="form-control" id="age" name="age" value="{{ page.age | default(value='') }}"></div>
  <div class="mb-3"><label class="form-label" for="email">Email address</label>
    <input class="form-control" id="email" name="email" type="email" value="{{ page.email | default(value='') }}"></div>
  <div class="mb-3"><label class="form-label" for="password">Password</label>
    <input class="form-control" id="password" name="password" type="password"></div>
  <button class="btn btn-primary" type="submit">Sign up</button>
</form>
{% endblock %}
"##;

const LOGIN: &str = r##"{% extends "layout.html" %}
{% block title %}Log in{% endblock %}
{% block content %}
<h2>Welcome back!</h2>
<form action="/login" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="email">Email address</label>
    <input class="form-control" id="email" name="email" type="email" value="{{ page.email | default(value='') }}"></div>
  <div class="mb-3"><label class="form-label" for="password">Password</label>
    <input class="form-control" id="password" name="password" type="password"></div>
  <button class="btn btn-primary" type="submit">Log in</button>
  <a class="ms-3" href="/forgot">Forgot your password?</a>
</form>
{% endblock %}
"##;

const FORGOT_PW: &str = r##"{% extends "layout.html" %}
{% block title %}Forgot password{% endblock %}
{% block content %}
<h2>Forgot your password?</h2>
<form action="/forgot" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="email">Email address</label>
    <input class="form-control" id="email" name="email" type="email" value="{{ page.email | default(value='') }}"></div>
  <button class="btn btn-primary" type="submit">Send reset instructions</button>
</form>
{% endblock %}
"##;

const RESET_PW: &str = r##"{% extends "layout.html" %}
{% block title %}Reset password{% endblock %}
{% block content %}
<h2>Reset your password</h2>
<form action="/reset" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="token">Reset token</label>
    <input class="form-control" id="token" name="token" value="{{ page.token | default(value='') }}"></div>
  <div class="mb-3"><label class="form-label" for="password">New password</label>
    <input class="form-control" id="password" name="password" type="password"></div>
  <button class="btn btn-primary" type="submit">Update password</button>
</form>
{% endblock %}
"##;

const GALLERIES_INDEX: &str = r##"{% extends "layout.html" %}
{% block title %}Galleries{% endblock %}
{% block content %}
<div class="d-flex justify-content-between mb-3">
  <h2>Your galleries</h2>
  <a class="btn btn-primary" href="/galleries/new">New gallery</a>
</div>
<table class="table">
  <thead><tr><th>#</th><th>Title</th><th></th></tr></thead>
  <tbody>
  {% for gallery in page %}
    <tr>
      <td>{{ gallery.id }}</td>
      <td>{{ gallery.title }}</td>
      <td><a href="/galleries/{{ gallery.id }}">View</a> | <a href="/galleries/{{ gallery.id }}/edit">Edit</a></td>
    </tr>
  {% endfor %}
  </tbody>
</table>
{% endblock %}
"##;

const GALLERIES_NEW: &str = r##"{% extends "layout.html" %}
{% block title %}New gallery{% endblock %}
{% block content %}
<h2>Create a gallery</h2>
<form action="/galleries" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="title">Title</label>
    <input class="form-control" id="title" name="title" value="{{ page.title | default(value='') }}"></div>
  <button class="btn btn-primary" type="submit">Create</button>
</form>
{% endblock %}
"##;

const GALLERIES_SHOW: &str = r##"{% extends "layout.html" %}
{% block title %}{{ page.title }}{% endblock %}
{% block content %}
<h1>{{ page.title }}</h1>
<div class="row">
  {% for image in page.images %}
  <div class="col-md-3 mb-3">
    <a href="{{ image.path | safe }}"><img class="img-thumbnail" src="{{ image.path | safe }}" alt="{{ image.filename }}"></a>
  </div>
  {% endfor %}
</div>
{% endblock %}
"##;

const GALLERIES_EDIT: &str = r##"{% extends "layout.html" %}
{% block title %}Edit {{ page.title }}{% endblock %}
{% block content %}
<h2>Edit your gallery</h2>
<a href="/galleries/{{ page.id }}">View this gallery</a>
<form class="my-3" action="/galleries/{{ page.id }}/update" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="title">Title</label>
    <input class="form-control" id="title" name="title" value="{{ page.title }}"></div>
  <button class="btn btn-primary" type="submit">Save</button>
</form>

<h4>Images</h4>
<div class="row">
  {% for image in page.images %}
  <div class="col-md-2 mb-3">
    <img class="img-thumbnail" src="{{ image.path | safe }}" alt="{{ image.filename }}">
    <form action="/galleries/{{ page.id }}/images/{{ image.filename | urlencode }}/delete" method="POST">
      <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
      <button class="btn btn-sm btn-outline-danger mt-1" type="submit">Delete</button>
    </form>
  </div>
  {% endfor %}
</div>

<form class="my-3" action="/galleries/{{ page.id }}/images" method="POST" enctype="multipart/form-data">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="images">Upload images</label>
    <input class="form-control" id="images" name="images" type="file" multiple></div>
  <button class="btn btn-secondary" type="submit">Upload</button>
</form>

<form class="my-3" action="/galleries/{{ page.id }}/images/link" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <div class="mb-3"><label class="form-label" for="files">Import an image by URL</label>
    <input class="form-control" id="files" name="files" type="url"></div>
  <button class="btn btn-secondary" type="submit">Import</button>
</form>

<form class="my-3" action="/galleries/{{ page.id }}/delete" method="POST">
  <input type="hidden" name="csrf_token" value="{{ csrf_token | default(value='') }}">
  <button class="btn btn-danger" type="submit">Delete gallery</button>
</form>
{% endblock %}
"##;
